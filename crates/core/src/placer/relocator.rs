//! Collision-safe relocation of finished outputs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::Filesystem;
use super::types::{ExistsPolicy, TemporaryFileSet};
use crate::processor::PipelineError;

/// Copies finished outputs to their destination without overwriting.
///
/// Failures stop at this boundary: they are logged and the artifact is
/// simply not tracked.
pub struct SafeRelocator {
    filesystem: Arc<dyn Filesystem>,
}

impl SafeRelocator {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Copies `source` to `destination`, or to the next free
    /// `name_N.ext` when `destination` is taken.
    ///
    /// On success the placed path is appended to `tracked` and returned.
    pub async fn relocate(
        &self,
        source: &Path,
        destination: &Path,
        tracked: &mut TemporaryFileSet,
    ) -> Option<PathBuf> {
        match self
            .filesystem
            .copy(source, destination, ExistsPolicy::Rename)
            .await
        {
            Ok(placed) => {
                debug!("Relocated {:?} to {:?}", source, placed);
                tracked.push(placed.clone());
                Some(placed)
            }
            Err(e) => {
                let missing = e.is_missing_source();
                let err = PipelineError::relocation_failed(source, destination, e);
                // Most temporaries have no derivative, so a missing source is routine.
                if missing {
                    debug!("{}", err);
                } else {
                    warn!("{}", err);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFilesystem;

    #[tokio::test]
    async fn test_relocate_tracks_new_path() {
        let fs = Arc::new(MockFilesystem::new());
        fs.insert_file("/tmp/photo.jpg.webp", b"webp").await;

        let relocator = SafeRelocator::new(fs.clone());
        let mut tracked = TemporaryFileSet::new();

        let placed = relocator
            .relocate(
                Path::new("/tmp/photo.jpg.webp"),
                Path::new("/srv/photo.jpg.webp"),
                &mut tracked,
            )
            .await;

        assert_eq!(placed, Some(PathBuf::from("/srv/photo.jpg.webp")));
        assert_eq!(tracked.snapshot(), vec![PathBuf::from("/srv/photo.jpg.webp")]);
        assert_eq!(
            fs.read_file("/srv/photo.jpg.webp").await,
            Some(b"webp".to_vec())
        );
    }

    #[tokio::test]
    async fn test_collision_picks_new_name() {
        let fs = Arc::new(MockFilesystem::new());
        fs.insert_file("/tmp/photo.jpg.webp", b"new").await;
        fs.insert_file("/srv/photo.jpg.webp", b"existing").await;

        let relocator = SafeRelocator::new(fs.clone());
        let mut tracked = TemporaryFileSet::new();

        let placed = relocator
            .relocate(
                Path::new("/tmp/photo.jpg.webp"),
                Path::new("/srv/photo.jpg.webp"),
                &mut tracked,
            )
            .await
            .unwrap();

        assert_ne!(placed, PathBuf::from("/srv/photo.jpg.webp"));
        assert_eq!(placed, PathBuf::from("/srv/photo.jpg_0.webp"));
        assert_eq!(
            fs.read_file("/srv/photo.jpg.webp").await,
            Some(b"existing".to_vec())
        );
        assert!(tracked.contains(&placed));
    }

    #[tokio::test]
    async fn test_failure_does_not_affect_siblings() {
        let fs = Arc::new(MockFilesystem::new());
        fs.insert_file("/tmp/a.png.webp", b"webp").await;
        fs.insert_file("/tmp/a.png.avif", b"avif").await;
        fs.fail_destination("/srv/a.png.webp").await;

        let relocator = SafeRelocator::new(fs.clone());
        let mut tracked = TemporaryFileSet::new();

        let webp = relocator
            .relocate(
                Path::new("/tmp/a.png.webp"),
                Path::new("/srv/a.png.webp"),
                &mut tracked,
            )
            .await;
        let avif = relocator
            .relocate(
                Path::new("/tmp/a.png.avif"),
                Path::new("/srv/a.png.avif"),
                &mut tracked,
            )
            .await;

        assert!(webp.is_none());
        assert_eq!(avif, Some(PathBuf::from("/srv/a.png.avif")));
        assert_eq!(tracked.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_is_not_tracked() {
        let fs = Arc::new(MockFilesystem::new());
        let relocator = SafeRelocator::new(fs);
        let mut tracked = TemporaryFileSet::new();

        let placed = relocator
            .relocate(
                Path::new("/tmp/none.webp"),
                Path::new("/srv/none.webp"),
                &mut tracked,
            )
            .await;

        assert!(placed.is_none());
        assert!(tracked.is_empty());
    }
}
