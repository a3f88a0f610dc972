//! Argument building for `convert`.

use std::path::{Component, Path, PathBuf};

use super::config::{ProcessorConfig, Quality};
use super::types::{CommandSet, CommandSpec, VariantKind};

/// Builds `convert` invocations from a processor configuration.
///
/// The primary command optimizes the image in place. Each enabled variant
/// reads the same source and writes `<dst>.webp` or `<dst>.avif`.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    executable: PathBuf,
}

impl CommandBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Builds the primary command and one command per enabled variant.
    ///
    /// The result depends only on the inputs, so building twice yields
    /// identical argument lists.
    pub fn build(&self, source: &Path, config: &ProcessorConfig) -> CommandSet {
        let dst = sanitize_path(source);
        let options = base_options(&dst, config);

        let mut set = CommandSet::new(self.command(&options, config.quality, &dst));

        for kind in VariantKind::ALL {
            let variant = config.variant(kind);
            if !variant.enabled {
                continue;
            }
            let quality = variant.quality.or(config.quality);
            let output = kind.derivative_path(&dst);
            set.insert_variant(kind, self.command(&options, quality, &output));
        }

        set
    }

    fn command(&self, options: &[String], quality: Option<Quality>, output: &Path) -> CommandSpec {
        let mut args = options.to_vec();
        if let Some(quality) = quality {
            args.push("-quality".to_string());
            args.push(quality.to_string());
        }
        args.push(path_arg(output));
        CommandSpec::new(self.executable.clone(), args, output)
    }
}

/// Options shared by the primary and variant commands, up to but not
/// including `-quality`.
fn base_options(dst: &Path, config: &ProcessorConfig) -> Vec<String> {
    let mut options = vec![path_arg(dst), "-quiet".to_string(), "-strip".to_string()];

    if let Some(density) = config.density {
        options.push("-density".to_string());
        options.push(density.to_string());
    }

    if let Some(colorspace) = config.colorspace {
        options.push("-colorspace".to_string());
        options.push(colorspace.as_arg().to_string());
    }

    options.extend(config.extra_args());
    options
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Normalizes a path lexically so it is safe to hand to ImageMagick.
///
/// `.` components and repeated separators disappear and `..` is resolved
/// against the preceding component when there is one. The filesystem is never
/// consulted, so when that component is a symlink the result names a
/// different file than the kernel would resolve. Callers holding such paths
/// should canonicalize them first. A relative path whose
/// first component starts with `-` or contains `:` gets a `./` prefix so it
/// is never parsed as an option or a coder prefix such as `msl:`.
pub fn sanitize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let mut normalized: PathBuf = parts.iter().collect();

    if let Some(Component::Normal(first)) = parts.first() {
        let first = first.to_string_lossy();
        if first.starts_with('-') || first.contains(':') {
            normalized = Path::new(".").join(normalized);
        }
    }

    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(spec: &CommandSpec) -> Vec<&str> {
        spec.args().iter().map(String::as_str).collect()
    }

    fn builder() -> CommandBuilder {
        CommandBuilder::new("/usr/bin/convert")
    }

    #[test]
    fn test_default_primary_layout() {
        let set = builder().build(Path::new("photo.jpg"), &ProcessorConfig::default());

        assert_eq!(set.primary().executable(), Path::new("/usr/bin/convert"));
        assert_eq!(
            args(set.primary()),
            vec![
                "photo.jpg",
                "-quiet",
                "-strip",
                "-density",
                "72",
                "-colorspace",
                "sRGB",
                "-sampling-factor",
                "4:2:0",
                "-quality",
                "70",
                "photo.jpg",
            ]
        );
        assert_eq!(set.primary().output(), Path::new("photo.jpg"));
    }

    #[test]
    fn test_webp_only_scenario() {
        let config = ProcessorConfig::default()
            .with_quality(Quality::new(70))
            .with_variant(VariantKind::Webp, true, Quality::new(60))
            .with_variant(VariantKind::Avif, false, Quality::new(40));

        let set = builder().build(Path::new("photo.jpg"), &config);

        let primary = args(set.primary());
        assert_eq!(&primary[primary.len() - 3..], &["-quality", "70", "photo.jpg"]);

        let webp = set.variant(VariantKind::Webp).unwrap();
        let webp_args = args(webp);
        assert_eq!(
            &webp_args[webp_args.len() - 3..],
            &["-quality", "60", "photo.jpg.webp"]
        );
        assert_eq!(webp.output(), Path::new("photo.jpg.webp"));

        assert!(set.variant(VariantKind::Avif).is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_disabling_variants_keeps_primary_args() {
        let all = ProcessorConfig::default();
        let none = ProcessorConfig::default()
            .with_variant(VariantKind::Webp, false, None)
            .with_variant(VariantKind::Avif, false, None);

        let with_variants = builder().build(Path::new("a/b.png"), &all);
        let without = builder().build(Path::new("a/b.png"), &none);

        assert_eq!(with_variants.primary(), without.primary());
        assert_eq!(without.len(), 1);
    }

    #[test]
    fn test_missing_quality_omits_flag() {
        let config = ProcessorConfig::default()
            .with_quality(Quality::new(150))
            .with_variant(VariantKind::Webp, true, None)
            .with_variant(VariantKind::Avif, true, Quality::new(-3));

        let set = builder().build(Path::new("photo.jpg"), &config);

        assert!(!set.primary().args().iter().any(|a| a == "-quality"));
        for (_, spec) in set.variants() {
            assert!(!spec.args().iter().any(|a| a == "-quality"));
        }
    }

    #[test]
    fn test_variant_without_quality_inherits_primary() {
        let config = ProcessorConfig::default()
            .with_quality(Quality::new(82))
            .with_variant(VariantKind::Avif, true, None);

        let set = builder().build(Path::new("photo.jpg"), &config);
        let avif = args(set.variant(VariantKind::Avif).unwrap());
        assert_eq!(&avif[avif.len() - 3..], &["-quality", "82", "photo.jpg.avif"]);
    }

    #[test]
    fn test_optional_flags_omitted() {
        let config = ProcessorConfig::default()
            .with_density(None)
            .with_colorspace(None)
            .with_exec("")
            .with_quality(None);

        let set = builder().build(Path::new("photo.jpg"), &config);
        assert_eq!(
            args(set.primary()),
            vec!["photo.jpg", "-quiet", "-strip", "photo.jpg"]
        );
    }

    #[test]
    fn test_quoted_extra_argument_stays_whole() {
        let config = ProcessorConfig::default()
            .with_density(None)
            .with_colorspace(None)
            .with_exec(r#"-comment "hello world""#)
            .with_quality(None);

        let set = builder().build(Path::new("photo.jpg"), &config);
        assert_eq!(
            args(set.primary()),
            vec!["photo.jpg", "-quiet", "-strip", "-comment", "hello world", "photo.jpg"]
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = ProcessorConfig::default();
        let first = builder().build(Path::new("./uploads/../photo.jpg"), &config);
        let second = builder().build(Path::new("./uploads/../photo.jpg"), &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path(Path::new("a/./b//c.jpg")), PathBuf::from("a/b/c.jpg"));
        assert_eq!(sanitize_path(Path::new("a/b/../c.jpg")), PathBuf::from("a/c.jpg"));
        assert_eq!(sanitize_path(Path::new("/../etc/x.png")), PathBuf::from("/etc/x.png"));
        assert_eq!(sanitize_path(Path::new("../x.png")), PathBuf::from("../x.png"));
        assert_eq!(sanitize_path(Path::new("-rf.jpg")), PathBuf::from("./-rf.jpg"));
        assert_eq!(sanitize_path(Path::new("msl:evil.xml")), PathBuf::from("./msl:evil.xml"));
        assert_eq!(sanitize_path(Path::new("dir/-x.jpg")), PathBuf::from("dir/-x.jpg"));
        assert_eq!(sanitize_path(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_dash_prefixed_source_is_not_an_option() {
        let set = builder().build(Path::new("-write.jpg"), &ProcessorConfig::default());
        assert_eq!(set.primary().args()[0], "./-write.jpg");
        assert_eq!(
            set.variant(VariantKind::Webp).unwrap().output(),
            Path::new("./-write.jpg.webp")
        );
    }
}
