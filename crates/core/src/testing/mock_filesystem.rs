//! In-memory filesystem for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::placer::{exists_rename_candidate, ExistsPolicy, Filesystem, PlacerError};

const MAX_RENAME_ATTEMPTS: u32 = 1000;

/// Mock implementation of the Filesystem trait.
///
/// Files live in a map keyed by path. Copies to destinations registered
/// with `fail_destination` fail with a permission error.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    failing: Arc<RwLock<HashSet<PathBuf>>>,
    copies: Arc<RwLock<usize>>,
}

impl MockFilesystem {
    /// Create an empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_file(&self, path: impl Into<PathBuf>, contents: &[u8]) {
        self.files.write().await.insert(path.into(), contents.to_vec());
    }

    pub async fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.read().await.get(path.as_ref()).cloned()
    }

    /// Make every copy to `path` fail.
    pub async fn fail_destination(&self, path: impl Into<PathBuf>) {
        self.failing.write().await.insert(path.into());
    }

    /// Number of copy calls, successful or not.
    pub async fn copy_count(&self) -> usize {
        *self.copies.read().await
    }
}

#[async_trait]
impl Filesystem for MockFilesystem {
    fn name(&self) -> &str {
        "mock"
    }

    async fn copy(
        &self,
        source: &Path,
        destination: &Path,
        policy: ExistsPolicy,
    ) -> Result<PathBuf, PlacerError> {
        *self.copies.write().await += 1;

        let mut files = self.files.write().await;
        let contents = files
            .get(source)
            .cloned()
            .ok_or_else(|| PlacerError::source_not_found(source))?;

        if self.failing.read().await.contains(destination) {
            return Err(PlacerError::copy_failed(
                source.to_path_buf(),
                destination.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "mock failure"),
            ));
        }

        let placed = match policy {
            ExistsPolicy::Replace => destination.to_path_buf(),
            ExistsPolicy::Error if files.contains_key(destination) => {
                return Err(PlacerError::DestinationExists {
                    path: destination.to_path_buf(),
                });
            }
            ExistsPolicy::Error => destination.to_path_buf(),
            ExistsPolicy::Rename => std::iter::once(destination.to_path_buf())
                .chain((0..MAX_RENAME_ATTEMPTS).map(|n| exists_rename_candidate(destination, n)))
                .find(|candidate| !files.contains_key(candidate))
                .ok_or_else(|| PlacerError::RenameExhausted {
                    path: destination.to_path_buf(),
                    attempts: MAX_RENAME_ATTEMPTS,
                })?,
        };

        files.insert(placed.clone(), contents);
        Ok(placed)
    }

    async fn exists(&self, path: &Path) -> bool {
        self.files.read().await.contains_key(path)
    }
}
