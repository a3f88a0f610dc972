//! Recording processor for pipeline tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::magick::VariantKind;
use crate::processor::Processor;

use super::MockFilesystem;

/// Processor that records each call and fakes its outputs.
///
/// On success it writes `<image>.webp` and `<image>.avif`, and rewrites
/// the image itself when given contents. Files go to disk unless a
/// `MockFilesystem` is attached.
#[derive(Debug, Clone)]
pub struct RecordingProcessor {
    succeed: bool,
    contents: Option<Vec<u8>>,
    filesystem: Option<Arc<MockFilesystem>>,
    calls: Arc<RwLock<Vec<PathBuf>>>,
}

impl RecordingProcessor {
    pub fn succeeding() -> Self {
        Self {
            succeed: true,
            contents: None,
            filesystem: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Fails without touching any file.
    pub fn failing() -> Self {
        Self {
            succeed: false,
            ..Self::succeeding()
        }
    }

    /// Contents written over the image and into the derivatives.
    pub fn writing(mut self, contents: &[u8]) -> Self {
        self.contents = Some(contents.to_vec());
        self
    }

    pub fn in_filesystem(mut self, filesystem: Arc<MockFilesystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Images this processor was applied to, in order.
    pub async fn calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> bool {
        match &self.filesystem {
            Some(fs) => {
                fs.insert_file(path, contents).await;
                true
            }
            None => tokio::fs::write(path, contents).await.is_ok(),
        }
    }
}

#[async_trait]
impl Processor for RecordingProcessor {
    fn id(&self) -> &str {
        "recording"
    }

    async fn apply_to_image(&self, image: &Path) -> bool {
        self.calls.write().await.push(image.to_path_buf());
        if !self.succeed {
            return false;
        }

        let derivative = match &self.contents {
            Some(contents) => {
                if !self.write(image, contents).await {
                    return false;
                }
                contents.clone()
            }
            None => b"derivative".to_vec(),
        };

        let mut ok = true;
        for kind in VariantKind::ALL {
            ok &= self.write(&kind.derivative_path(image), &derivative).await;
        }
        ok
    }
}
