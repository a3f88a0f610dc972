//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits so
//! the pipeline can be exercised without ImageMagick installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use optimagick_core::testing::{MockInvoker, StaticLocator};
//!
//! let invoker = MockInvoker::new();
//! invoker.fail_outputs_ending_with(".avif").await;
//!
//! let processor = MagickProcessor::new(ProcessorConfig::default(), Arc::new(invoker.clone()))
//!     .with_locator(Arc::new(StaticLocator::found("/usr/bin/convert")));
//!
//! processor.apply_to_image(Path::new("photo.jpg")).await;
//! assert_eq!(invoker.invocation_count().await, 3);
//! ```

mod mock_filesystem;
mod mock_invoker;
mod mock_locator;
mod mock_processor;
mod mock_validator;

pub use mock_filesystem::MockFilesystem;
pub use mock_invoker::MockInvoker;
pub use mock_locator::StaticLocator;
pub use mock_processor::RecordingProcessor;
pub use mock_validator::MockValidator;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::magick::{ProcessorConfig, Quality, VariantKind};

    /// Default options with the given variants switched on or off.
    pub fn processor_config(webp: bool, avif: bool) -> ProcessorConfig {
        ProcessorConfig::default()
            .with_variant(VariantKind::Webp, webp, Quality::new(60))
            .with_variant(VariantKind::Avif, avif, Quality::new(40))
    }

    /// Writes a fake image into `dir` and returns its path.
    pub fn image_file(dir: &Path, name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
