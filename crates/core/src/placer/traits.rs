//! Trait definitions for the placer module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::PlacerError;
use super::types::ExistsPolicy;

/// Filesystem operations the pipeline needs.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Returns the name of this filesystem implementation.
    fn name(&self) -> &str;

    /// Copies `source` to `destination` and returns the path written.
    ///
    /// With `ExistsPolicy::Rename` the returned path may differ from
    /// `destination`. The source is never modified.
    async fn copy(
        &self,
        source: &Path,
        destination: &Path,
        policy: ExistsPolicy,
    ) -> Result<PathBuf, PlacerError>;

    async fn exists(&self, path: &Path) -> bool;
}
