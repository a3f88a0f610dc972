//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// What to do when the destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistsPolicy {
    /// Pick a free `name_N.ext` next to the destination.
    Rename,
    /// Overwrite the destination.
    Replace,
    /// Fail with `DestinationExists`.
    Error,
}

/// Returns the `counter`-th exists-rename candidate for `path`.
///
/// The counter goes before the last extension: `a/photo.jpg.webp` with
/// counter 0 becomes `a/photo.jpg_0.webp`. Names without an extension, and
/// dotfiles, get the counter appended.
pub fn exists_rename_candidate(path: &Path, counter: u32) -> PathBuf {
    let Some(name) = path.file_name() else {
        let mut raw = OsString::from(path.as_os_str());
        raw.push(format!("_{}", counter));
        return PathBuf::from(raw);
    };

    let name = name.to_string_lossy();
    let renamed = match name.rfind('.') {
        Some(i) if i > 0 => format!("{}_{}{}", &name[..i], counter, &name[i..]),
        _ => format!("{}_{}", name, counter),
    };
    path.with_file_name(renamed)
}

/// Ordered, append-only list of artifacts owned by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporaryFileSet {
    paths: Vec<PathBuf>,
}

impl TemporaryFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Entries tracked so far, detached from later appends.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    pub fn into_inner(self) -> Vec<PathBuf> {
        self.paths
    }
}
