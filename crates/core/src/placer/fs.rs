//! Local filesystem implementation.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;

use super::config::PlacerConfig;
use super::error::PlacerError;
use super::traits::Filesystem;
use super::types::{exists_rename_candidate, ExistsPolicy};

/// Filesystem backed by `tokio::fs`.
pub struct LocalFilesystem {
    config: PlacerConfig,
}

impl LocalFilesystem {
    /// Creates a new local filesystem with the given configuration.
    pub fn new(config: PlacerConfig) -> Self {
        Self { config }
    }

    /// Creates a local filesystem with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PlacerConfig::default())
    }

    async fn open_source(source: &Path) -> Result<File, PlacerError> {
        File::open(source).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PlacerError::source_not_found(source)
            } else {
                PlacerError::Io(e)
            }
        })
    }

    async fn ensure_parent_dir(&self, destination: &Path) -> Result<(), PlacerError> {
        if !self.config.create_parents {
            return Ok(());
        }
        match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).await.map_err(|e| {
                    PlacerError::DirectoryCreationFailed {
                        path: parent.to_path_buf(),
                        source: e,
                    }
                })
            }
            _ => Ok(()),
        }
    }

    /// Opens `path` only if nothing exists there yet.
    async fn create_new(path: &Path) -> std::io::Result<File> {
        OpenOptions::new().write(true).create_new(true).open(path).await
    }

    /// Claims the first free exists-rename candidate for `destination`.
    async fn claim_free_name(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(PathBuf, File), PlacerError> {
        let attempts = self.config.max_rename_attempts;

        for attempt in 0..=attempts {
            let candidate = if attempt == 0 {
                destination.to_path_buf()
            } else {
                exists_rename_candidate(destination, attempt - 1)
            };

            match Self::create_new(&candidate).await {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{:?} exists, trying next name", candidate);
                }
                Err(e) => {
                    return Err(PlacerError::copy_failed(source.to_path_buf(), candidate, e));
                }
            }
        }

        Err(PlacerError::RenameExhausted {
            path: destination.to_path_buf(),
            attempts,
        })
    }

    /// Streams `source_file` into `dest_file`, removing the destination on
    /// failure.
    async fn write_contents(
        &self,
        source_file: File,
        dest_file: File,
        source: &Path,
        destination: &Path,
    ) -> Result<u64, PlacerError> {
        let result = async {
            let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
            let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
            let bytes = tokio::io::copy_buf(&mut reader, &mut writer).await?;
            writer.flush().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        match result {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                let _ = fs::remove_file(destination).await;
                Err(PlacerError::copy_failed(
                    source.to_path_buf(),
                    destination.to_path_buf(),
                    e,
                ))
            }
        }
    }

    async fn is_same_file(a: &Path, b: &Path) -> bool {
        match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Replaces `destination` through a temporary sibling and a rename so
    /// readers never observe a partial file.
    async fn replace(
        &self,
        source_file: File,
        source: &Path,
        destination: &Path,
    ) -> Result<PathBuf, PlacerError> {
        if Self::is_same_file(source, destination).await {
            return Ok(destination.to_path_buf());
        }

        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = destination.with_file_name(format!(
            ".{}.{}.part",
            name,
            uuid::Uuid::new_v4().simple()
        ));

        let part_file = Self::create_new(&part)
            .await
            .map_err(|e| PlacerError::copy_failed(source.to_path_buf(), part.clone(), e))?;
        self.write_contents(source_file, part_file, source, &part)
            .await?;

        // The replacement keeps the mode of the file it supersedes.
        if let Ok(existing) = fs::metadata(destination).await {
            if let Err(e) = fs::set_permissions(&part, existing.permissions()).await {
                debug!("Could not copy permissions onto {:?}: {}", part, e);
            }
        }

        if let Err(e) = fs::rename(&part, destination).await {
            let _ = fs::remove_file(&part).await;
            return Err(PlacerError::copy_failed(
                source.to_path_buf(),
                destination.to_path_buf(),
                e,
            ));
        }

        Ok(destination.to_path_buf())
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    fn name(&self) -> &str {
        "local"
    }

    async fn copy(
        &self,
        source: &Path,
        destination: &Path,
        policy: ExistsPolicy,
    ) -> Result<PathBuf, PlacerError> {
        let source_file = Self::open_source(source).await?;
        self.ensure_parent_dir(destination).await?;

        match policy {
            ExistsPolicy::Rename => {
                let (placed, dest_file) = self.claim_free_name(source, destination).await?;
                let bytes = self
                    .write_contents(source_file, dest_file, source, &placed)
                    .await?;
                debug!("Copied {:?} to {:?} ({} bytes)", source, placed, bytes);
                Ok(placed)
            }
            ExistsPolicy::Error => {
                let dest_file = Self::create_new(destination).await.map_err(|e| {
                    if e.kind() == ErrorKind::AlreadyExists {
                        PlacerError::DestinationExists {
                            path: destination.to_path_buf(),
                        }
                    } else {
                        PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
                    }
                })?;
                self.write_contents(source_file, dest_file, source, destination)
                    .await?;
                Ok(destination.to_path_buf())
            }
            ExistsPolicy::Replace => self.replace(source_file, source, destination).await,
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }
}
