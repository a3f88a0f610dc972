//! Fixed executable locator for testing.

use std::path::{Path, PathBuf};

use crate::magick::ExecutableLocator;

/// Locator that always returns the same answer.
#[derive(Debug, Clone)]
pub struct StaticLocator {
    resolved: Option<PathBuf>,
}

impl StaticLocator {
    /// Every lookup resolves to `path`.
    pub fn found(path: impl Into<PathBuf>) -> Self {
        Self {
            resolved: Some(path.into()),
        }
    }

    /// Every lookup fails.
    pub fn missing() -> Self {
        Self { resolved: None }
    }
}

impl ExecutableLocator for StaticLocator {
    fn locate(&self, _program: &Path) -> Option<PathBuf> {
        self.resolved.clone()
    }
}
