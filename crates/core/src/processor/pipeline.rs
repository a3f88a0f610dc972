//! Optimization pipeline.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::magick::{ImageValidator, VariantKind};
use crate::placer::{ExistsPolicy, Filesystem, SafeRelocator, TemporaryFileSet};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::traits::Processor;
use super::types::PipelineReport;

/// Optimizes images in place and places their derivatives.
pub struct OptimizePipeline {
    config: PipelineConfig,
    validator: Arc<dyn ImageValidator>,
    filesystem: Arc<dyn Filesystem>,
    relocator: SafeRelocator,
    processors: Vec<Arc<dyn Processor>>,
}

impl OptimizePipeline {
    /// Creates a pipeline without processors.
    pub fn new(
        config: PipelineConfig,
        validator: Arc<dyn ImageValidator>,
        filesystem: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            config,
            validator,
            relocator: SafeRelocator::new(filesystem.clone()),
            filesystem,
            processors: Vec::new(),
        }
    }

    /// Appends a processor. Processors run in the order they were added.
    pub fn with_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn processors(&self) -> usize {
        self.processors.len()
    }

    /// Optimizes `image` and returns only whether everything succeeded.
    pub async fn apply_to_image(&self, image: &Path) -> bool {
        match self.run(image).await {
            Ok(mut report) => {
                if let Err(e) = report.cleanup() {
                    warn!("Failed to remove scratch directory: {}", e);
                }
                report.succeeded
            }
            Err(e) => {
                error!("Optimizing {:?} failed: {}", image, e);
                false
            }
        }
    }

    /// Runs every processor on a working copy of `image`, promotes the
    /// result over the original and places derivatives next to it.
    pub async fn run(&self, image: &Path) -> Result<PipelineReport, PipelineError> {
        if !self.validator.is_valid(image).await {
            return Err(PipelineError::InvalidSourceImage {
                path: image.to_path_buf(),
            });
        }

        if self.processors.is_empty() {
            info!("No processors configured, leaving {:?} untouched", image);
            return Ok(PipelineReport::empty(image));
        }

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let scratch = tempfile::Builder::new()
            .prefix("optimagick_")
            .tempdir_in(&self.config.temp_dir)?;

        let working = scratch.path().join(working_name(image));
        self.filesystem
            .copy(image, &working, ExistsPolicy::Error)
            .await
            .map_err(|source| PipelineError::Staging {
                path: image.to_path_buf(),
                source,
            })?;

        let mut tracked = TemporaryFileSet::new();
        tracked.push(working.clone());

        let mut succeeded = true;
        let mut image_changed = false;

        for processor in &self.processors {
            let ok = processor.apply_to_image(&working).await;
            debug!("Processor {} on {:?}: {}", processor.id(), image, ok);
            succeeded &= ok;
            image_changed |= ok;
        }

        if image_changed {
            if let Err(e) = self
                .filesystem
                .copy(&working, image, ExistsPolicy::Replace)
                .await
            {
                error!("Failed to replace {:?} with optimized copy: {}", image, e);
                succeeded = false;
            }
        }

        let derivatives = self.copy_derivatives(image, &mut tracked).await;

        info!(
            "Optimized {:?}: succeeded={}, changed={}, derivatives={}",
            image,
            succeeded,
            image_changed,
            derivatives.len()
        );

        Ok(PipelineReport {
            image: image.to_path_buf(),
            succeeded,
            image_changed,
            temporary_files: tracked,
            derivatives,
            scratch: Some(scratch),
        })
    }

    /// Places `<temp>.webp` and `<temp>.avif` of every tracked temporary
    /// next to `image`.
    ///
    /// Runs for both formats regardless of which variants are enabled;
    /// outputs that were never produced are skipped.
    async fn copy_derivatives(
        &self,
        image: &Path,
        tracked: &mut TemporaryFileSet,
    ) -> Vec<PathBuf> {
        let mut placed = Vec::new();

        for temp in tracked.snapshot() {
            for kind in VariantKind::ALL {
                let source = kind.derivative_path(&temp);
                let destination = kind.derivative_path(image);
                if let Some(path) = self.relocator.relocate(&source, &destination, tracked).await {
                    placed.push(path);
                }
            }
        }

        placed
    }
}

/// Working-copy name inside the per-run scratch directory. The original
/// file name is kept so ImageMagick still detects the format.
fn working_name(image: &Path) -> &OsStr {
    image.file_name().unwrap_or(OsStr::new("image"))
}
