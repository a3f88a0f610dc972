//! Source image validation through `identify`.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::time::Duration;
use tracing::debug;

use super::builder::sanitize_path;
use super::config::MagickConfig;
use super::error::InvokeError;
use super::process::capture;
use super::traits::ImageValidator;

/// Basic image properties reported by `identify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// ImageMagick format name, e.g. `JPEG`.
    pub format: String,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Parses the first line of `identify -format "%m %w %h\n"` output.
    pub fn parse(output: &str) -> Option<Self> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let re = PATTERN
            .get_or_init(|| Regex::new(r"^(\S+) (\d+) (\d+)").ok())
            .as_ref()?;

        let line = output.lines().next()?.trim();
        let caps = re.captures(line)?;

        Some(Self {
            format: caps.get(1)?.as_str().to_string(),
            width: caps.get(2)?.as_str().parse().ok()?,
            height: caps.get(3)?.as_str().parse().ok()?,
        })
    }
}

/// Validates images by asking ImageMagick to identify them.
#[derive(Debug, Clone)]
pub struct IdentifyValidator {
    identify_path: PathBuf,
    timeout: Option<Duration>,
}

impl IdentifyValidator {
    pub fn new(config: &MagickConfig) -> Self {
        Self {
            identify_path: config.identify_path.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Runs `identify` and returns the reported properties.
    pub async fn probe(&self, path: &Path) -> Result<ImageInfo, InvokeError> {
        let args = vec![
            "-quiet".to_string(),
            "-format".to_string(),
            "%m %w %h\n".to_string(),
            sanitize_path(path).to_string_lossy().into_owned(),
        ];

        let output = capture(&self.identify_path, &args, self.timeout).await?;
        if !output.status.success() {
            return Err(InvokeError::non_zero_exit(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        ImageInfo::parse(&stdout).ok_or_else(|| InvokeError::UnrecognizedOutput {
            output: stdout.trim().to_string(),
        })
    }
}

#[async_trait]
impl ImageValidator for IdentifyValidator {
    async fn is_valid(&self, path: &Path) -> bool {
        match self.probe(path).await {
            Ok(info) => {
                debug!(
                    "Identified {:?} as {} {}x{}",
                    path, info.format, info.width, info.height
                );
                info.width > 0 && info.height > 0
            }
            Err(e) => {
                debug!("Image {:?} failed identification: {}", path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identify_output() {
        let info = ImageInfo::parse("JPEG 1920 1080\n").unwrap();
        assert_eq!(info.format, "JPEG");
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
    }

    #[test]
    fn test_parse_uses_first_frame_only() {
        let info = ImageInfo::parse("GIF 10 20\nGIF 30 40\n").unwrap();
        assert_eq!((info.width, info.height), (10, 20));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ImageInfo::parse("").is_none());
        assert!(ImageInfo::parse("identify: improper image header").is_none());
        assert!(ImageInfo::parse("PNG wide 10").is_none());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn fake_identify(dir: &Path, script: &str) -> MagickConfig {
            let path = dir.join("identify");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            MagickConfig::with_paths(PathBuf::from("convert"), path)
        }

        #[tokio::test]
        async fn test_valid_image() {
            let dir = TempDir::new().unwrap();
            let config = fake_identify(dir.path(), "echo 'PNG 640 480'");
            let validator = IdentifyValidator::new(&config);

            assert!(validator.is_valid(Path::new("photo.png")).await);
            let info = validator.probe(Path::new("photo.png")).await.unwrap();
            assert_eq!(info.format, "PNG");
        }

        #[tokio::test]
        async fn test_zero_dimensions_are_invalid() {
            let dir = TempDir::new().unwrap();
            let config = fake_identify(dir.path(), "echo 'PNG 0 480'");
            assert!(!IdentifyValidator::new(&config).is_valid(Path::new("x.png")).await);
        }

        #[tokio::test]
        async fn test_failing_identify_is_invalid() {
            let dir = TempDir::new().unwrap();
            let config = fake_identify(dir.path(), "echo 'corrupt' >&2; exit 1");
            let validator = IdentifyValidator::new(&config);

            assert!(!validator.is_valid(Path::new("x.png")).await);
            assert!(matches!(
                validator.probe(Path::new("x.png")).await,
                Err(InvokeError::NonZeroExit { code: Some(1), .. })
            ));
        }

        #[tokio::test]
        async fn test_last_argument_is_sanitized_path() {
            let dir = TempDir::new().unwrap();
            // Prints its last argument in place of the format name.
            let config = fake_identify(dir.path(), r#"for a; do last="$a"; done; echo "$last 1 1""#);
            let info = IdentifyValidator::new(&config)
                .probe(Path::new("-x.png"))
                .await
                .unwrap();
            assert_eq!(info.format, "./-x.png");
        }
    }
}
