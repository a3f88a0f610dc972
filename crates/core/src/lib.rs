//! ImageMagick based image optimization.
//!
//! An image is copied into a scratch working copy, optimized in place by
//! each configured processor, promoted back over the original, and its
//! WebP/AVIF derivatives are placed next to it without overwriting
//! anything.

pub mod config;
pub mod magick;
pub mod placer;
pub mod processor;
pub mod testing;

pub use config::{load_config, load_config_from_env, validate_config, Config, ConfigError};
pub use magick::{
    CommandBuilder, IdentifyValidator, MagickInvoker, MagickProcessor, PathLocator,
    ProcessorConfig,
};
pub use placer::{LocalFilesystem, SafeRelocator, TemporaryFileSet};
pub use processor::{OptimizePipeline, PipelineError, PipelineReport, Processor};
