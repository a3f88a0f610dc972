//! Mock image validator for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::magick::ImageValidator;

/// Validator with a fixed verdict that records what it was asked about.
#[derive(Debug, Clone)]
pub struct MockValidator {
    valid: bool,
    checked: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockValidator {
    pub fn valid() -> Self {
        Self {
            valid: true,
            checked: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            ..Self::valid()
        }
    }

    /// Paths checked so far.
    pub async fn checked(&self) -> Vec<PathBuf> {
        self.checked.read().await.clone()
    }
}

#[async_trait]
impl ImageValidator for MockValidator {
    async fn is_valid(&self, path: &Path) -> bool {
        self.checked.write().await.push(path.to_path_buf());
        self.valid
    }
}
