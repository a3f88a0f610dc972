//! Processor module for the optimization pipeline.
//!
//! This module coordinates one optimization run:
//! - Staging: copying the source into a scratch working copy
//! - Processing: running each configured processor on the working copy
//! - Promotion: replacing the original with the optimized working copy
//! - Derivatives: placing `.webp`/`.avif` outputs next to the original
//!
//! Within one processor, the `DerivativeOrchestrator` runs the primary
//! conversion and then each enabled variant, strictly in sequence.
//!
//! # Example
//!
//! ```ignore
//! use optimagick_core::processor::{OptimizePipeline, PipelineConfig};
//!
//! let pipeline = OptimizePipeline::new(PipelineConfig::default(), validator, filesystem)
//!     .with_processor(Arc::new(processor));
//!
//! let report = pipeline.run(Path::new("/srv/files/photo.jpg")).await?;
//! println!("succeeded: {}, derivatives: {:?}", report.succeeded, report.derivatives);
//! ```

mod config;
mod error;
mod orchestrator;
mod pipeline;
mod traits;
mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::DerivativeOrchestrator;
pub use pipeline::OptimizePipeline;
pub use traits::Processor;
pub use types::{DerivativeOutcome, OrchestratorState, PipelineReport};
