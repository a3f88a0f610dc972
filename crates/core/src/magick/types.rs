//! Types shared by the command builder and the invokers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use super::config::Quality;
use super::error::InvokeError;

/// Alternative formats produced next to the primary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Webp,
    Avif,
}

impl VariantKind {
    /// All variants, in execution order.
    pub const ALL: [VariantKind; 2] = [VariantKind::Webp, VariantKind::Avif];

    /// Suffix appended to the full primary path.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Webp => ".webp",
            Self::Avif => ".avif",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    /// Returns `path` with this variant's suffix appended.
    ///
    /// `photo.jpg` becomes `photo.jpg.webp`; the original extension is kept.
    pub fn derivative_path(&self, path: &Path) -> PathBuf {
        let mut raw = OsString::from(path.as_os_str());
        raw.push(self.suffix());
        PathBuf::from(raw)
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enablement and quality override of a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSettings {
    pub enabled: bool,
    /// Falls back to the primary quality when absent.
    pub quality: Option<Quality>,
}

/// A single external command, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    executable: PathBuf,
    args: Vec<String>,
    output: PathBuf,
}

impl CommandSpec {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args,
            output: output.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments in order, without the executable.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// File the command is expected to produce.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Renders the command as a POSIX shell line, for display only.
    pub fn to_shell_string(&self) -> String {
        let mut line = shell_quote(&self.executable.to_string_lossy());
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line
    }
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,%@".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Commands for one source image: the primary conversion plus one per
/// enabled variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    primary: CommandSpec,
    variants: BTreeMap<VariantKind, CommandSpec>,
}

impl CommandSet {
    pub fn new(primary: CommandSpec) -> Self {
        Self {
            primary,
            variants: BTreeMap::new(),
        }
    }

    pub fn primary(&self) -> &CommandSpec {
        &self.primary
    }

    pub fn variant(&self, kind: VariantKind) -> Option<&CommandSpec> {
        self.variants.get(&kind)
    }

    /// Enabled variants in execution order.
    pub fn variants(&self) -> impl Iterator<Item = (VariantKind, &CommandSpec)> {
        self.variants.iter().map(|(kind, spec)| (*kind, spec))
    }

    pub fn insert_variant(&mut self, kind: VariantKind, spec: CommandSpec) {
        self.variants.insert(kind, spec);
    }

    /// Total number of commands, primary included.
    pub fn len(&self) -> usize {
        1 + self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Outcome of running one command.
#[derive(Debug)]
pub struct InvocationResult {
    /// True when the process exited zero and the output file exists.
    pub succeeded: bool,
    pub output: PathBuf,
    pub failure: Option<InvokeError>,
}

impl InvocationResult {
    pub fn success(output: impl Into<PathBuf>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
            failure: None,
        }
    }

    pub fn failure(output: impl Into<PathBuf>, error: InvokeError) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
            failure: Some(error),
        }
    }

    pub fn from_result(output: impl Into<PathBuf>, result: Result<(), InvokeError>) -> Self {
        match result {
            Ok(()) => Self::success(output),
            Err(e) => Self::failure(output, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivative_path_keeps_extension() {
        let path = Path::new("/var/www/files/styles/large/photo.jpg");
        assert_eq!(
            VariantKind::Webp.derivative_path(path),
            PathBuf::from("/var/www/files/styles/large/photo.jpg.webp")
        );
        assert_eq!(
            VariantKind::Avif.derivative_path(path),
            PathBuf::from("/var/www/files/styles/large/photo.jpg.avif")
        );
    }

    #[test]
    fn test_variant_order() {
        assert_eq!(VariantKind::ALL, [VariantKind::Webp, VariantKind::Avif]);
        assert!(VariantKind::Webp < VariantKind::Avif);
    }

    #[test]
    fn test_command_set_iterates_variants_in_order() {
        let mut set = CommandSet::new(CommandSpec::new("convert", vec![], "a.png"));
        set.insert_variant(
            VariantKind::Avif,
            CommandSpec::new("convert", vec![], "a.png.avif"),
        );
        set.insert_variant(
            VariantKind::Webp,
            CommandSpec::new("convert", vec![], "a.png.webp"),
        );

        let kinds: Vec<VariantKind> = set.variants().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![VariantKind::Webp, VariantKind::Avif]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_shell_string_quotes_unsafe_words() {
        let spec = CommandSpec::new(
            "/usr/bin/convert",
            vec![
                "my photo.jpg".to_string(),
                "-quality".to_string(),
                "70".to_string(),
                "it's.jpg".to_string(),
            ],
            "it's.jpg",
        );
        assert_eq!(
            spec.to_shell_string(),
            r"/usr/bin/convert 'my photo.jpg' -quality 70 'it'\''s.jpg'"
        );
    }

    #[test]
    fn test_invocation_result_from_result() {
        let ok = InvocationResult::from_result("out.png", Ok(()));
        assert!(ok.succeeded);
        assert!(ok.failure.is_none());

        let failed = InvocationResult::from_result(
            "out.png",
            Err(InvokeError::output_missing("out.png")),
        );
        assert!(!failed.succeeded);
        assert!(matches!(
            failed.failure,
            Some(InvokeError::OutputMissing { .. })
        ));
    }
}
