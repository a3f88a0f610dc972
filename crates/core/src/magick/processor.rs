//! The ImageMagick processor.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, warn};

use crate::processor::{DerivativeOrchestrator, DerivativeOutcome, PipelineError, Processor};

use super::builder::CommandBuilder;
use super::config::ProcessorConfig;
use super::locate::PathLocator;
use super::traits::{ExecutableLocator, ProcessInvoker};
use super::types::CommandSet;

/// Optimizes an image with `convert` and writes its WebP/AVIF variants.
pub struct MagickProcessor {
    config: ProcessorConfig,
    convert_path: PathBuf,
    invoker: Arc<dyn ProcessInvoker>,
    locator: Arc<dyn ExecutableLocator>,
}

impl MagickProcessor {
    /// Creates a processor that looks up `convert` on `PATH`.
    pub fn new(config: ProcessorConfig, invoker: Arc<dyn ProcessInvoker>) -> Self {
        Self {
            config,
            convert_path: PathBuf::from("convert"),
            invoker,
            locator: Arc::new(PathLocator::new()),
        }
    }

    /// Sets the configured binary name or path.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.convert_path = path.into();
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn ExecutableLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Resolves the binary and builds the commands for `image`.
    pub fn commands(&self, image: &Path) -> Result<CommandSet, PipelineError> {
        let executable = self.locator.locate(&self.convert_path).ok_or_else(|| {
            PipelineError::ExecutableNotFound {
                path: self.convert_path.clone(),
            }
        })?;
        Ok(CommandBuilder::new(executable).build(image, &self.config))
    }

    /// Runs the primary conversion and every enabled variant.
    pub async fn process(&self, image: &Path) -> Result<DerivativeOutcome, PipelineError> {
        let image = resolve_parent_dirs(image).await;
        let commands = self.commands(&image)?;
        Ok(DerivativeOrchestrator::new(commands, self.invoker.clone())
            .run()
            .await)
    }
}

/// Resolves `..` through the filesystem when the parent directory exists,
/// so a symlinked directory is followed the way the kernel follows it
/// before the path is normalized lexically.
async fn resolve_parent_dirs(image: &Path) -> PathBuf {
    if !image.components().any(|c| c == Component::ParentDir) {
        return image.to_path_buf();
    }

    match (image.parent(), image.file_name()) {
        (Some(parent), Some(name)) => match tokio::fs::canonicalize(parent).await {
            Ok(dir) => dir.join(name),
            Err(_) => image.to_path_buf(),
        },
        _ => image.to_path_buf(),
    }
}

#[async_trait]
impl Processor for MagickProcessor {
    fn id(&self) -> &str {
        "imagemagick"
    }

    async fn apply_to_image(&self, image: &Path) -> bool {
        match self.process(image).await {
            Ok(outcome) => {
                let succeeded = outcome.succeeded();
                for failure in outcome.into_failures() {
                    warn!("{}", failure);
                }
                succeeded
            }
            Err(e) => {
                error!("ImageMagick processing of {:?} failed: {}", image, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magick::{Quality, VariantKind};
    use crate::testing::{MockInvoker, StaticLocator};

    fn processor(config: ProcessorConfig, invoker: &MockInvoker) -> MagickProcessor {
        MagickProcessor::new(config, Arc::new(invoker.clone()))
            .with_locator(Arc::new(StaticLocator::found("/usr/bin/convert")))
    }

    #[tokio::test]
    async fn test_missing_executable_runs_nothing() {
        let invoker = MockInvoker::new();
        let processor = MagickProcessor::new(ProcessorConfig::default(), Arc::new(invoker.clone()))
            .with_locator(Arc::new(StaticLocator::missing()));

        assert!(matches!(
            processor.process(Path::new("photo.jpg")).await,
            Err(PipelineError::ExecutableNotFound { .. })
        ));
        assert!(!processor.apply_to_image(Path::new("photo.jpg")).await);
        assert_eq!(invoker.invocation_count().await, 0);
    }

    #[tokio::test]
    async fn test_uses_located_executable() {
        let invoker = MockInvoker::new();
        let processor = processor(ProcessorConfig::default(), &invoker);

        assert!(processor.apply_to_image(Path::new("photo.jpg")).await);

        let recorded = invoker.recorded_invocations().await;
        assert_eq!(recorded.len(), 3);
        assert!(recorded
            .iter()
            .all(|spec| spec.executable() == Path::new("/usr/bin/convert")));
    }

    #[tokio::test]
    async fn test_webp_only_scenario() {
        let config = ProcessorConfig::default()
            .with_quality(Quality::new(70))
            .with_variant(VariantKind::Webp, true, Quality::new(60))
            .with_variant(VariantKind::Avif, false, None);

        let invoker = MockInvoker::new();
        let processor = processor(config, &invoker);
        let outcome = processor.process(Path::new("photo.jpg")).await.unwrap();

        let recorded = invoker.recorded_invocations().await;
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].args().windows(2).any(|w| w == ["-quality", "70"]));
        assert!(recorded[1].args().windows(2).any(|w| w == ["-quality", "60"]));
        assert_eq!(recorded[1].output(), Path::new("photo.jpg.webp"));

        assert!(outcome.variant(VariantKind::Avif).is_none());
        assert_eq!(
            outcome.succeeded(),
            outcome.primary.succeeded && outcome.variant(VariantKind::Webp).unwrap().succeeded
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_parent_dir_follows_symlink() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("real").join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::os::unix::fs::symlink(&nested, dir.path().join("uploads")).unwrap();

        let invoker = MockInvoker::new();
        let processor = processor(ProcessorConfig::default(), &invoker);
        processor
            .process(&dir.path().join("uploads").join("..").join("photo.jpg"))
            .await
            .unwrap();

        let expected = std::fs::canonicalize(dir.path().join("real"))
            .unwrap()
            .join("photo.jpg");
        let recorded = invoker.recorded_invocations().await;
        assert_eq!(recorded[0].output(), expected.as_path());
    }

    #[tokio::test]
    async fn test_failed_variant_fails_processor() {
        let invoker = MockInvoker::new();
        invoker.fail_outputs_ending_with(".avif").await;

        let processor = processor(ProcessorConfig::default(), &invoker);
        assert!(!processor.apply_to_image(Path::new("photo.jpg")).await);
        assert_eq!(invoker.invocation_count().await, 3);
    }
}
