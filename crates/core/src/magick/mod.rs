//! ImageMagick integration.
//!
//! This module turns a processor configuration into concrete `convert`
//! invocations and runs them, one per output variant.
//!
//! # Features
//!
//! - Deterministic argument building (density, colorspace, extra args, quality)
//! - WebP and AVIF variants with per-variant quality overrides
//! - Executable lookup on `PATH`
//! - Optional per-invocation timeout
//! - Source validation through `identify`
//!
//! # Example
//!
//! ```ignore
//! use optimagick_core::magick::{CommandBuilder, MagickInvoker, ProcessInvoker, ProcessorConfig};
//!
//! let builder = CommandBuilder::new("/usr/bin/convert");
//! let commands = builder.build(Path::new("photo.jpg"), &ProcessorConfig::default());
//!
//! let invoker = MagickInvoker::with_defaults();
//! let result = invoker.run(commands.primary()).await;
//! println!("primary ok: {}", result.succeeded);
//! ```

mod builder;
mod config;
mod error;
mod identify;
mod locate;
mod process;
mod processor;
mod traits;
mod types;

pub use builder::{sanitize_path, CommandBuilder};
pub use config::{Colorspace, MagickConfig, ProcessorConfig, Quality};
pub use error::InvokeError;
pub use identify::{IdentifyValidator, ImageInfo};
pub use locate::PathLocator;
pub use process::MagickInvoker;
pub use processor::MagickProcessor;
pub use traits::{ExecutableLocator, ImageValidator, ProcessInvoker};
pub use types::{CommandSet, CommandSpec, InvocationResult, VariantKind, VariantSettings};
