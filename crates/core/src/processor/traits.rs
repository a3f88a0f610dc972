//! Trait definitions for the processor module.

use async_trait::async_trait;
use std::path::Path;

/// One optimization step applied to an image in place.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    /// Optimizes `image` in place. Returns false on any failure.
    async fn apply_to_image(&self, image: &Path) -> bool;
}
