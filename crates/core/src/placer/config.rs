//! Configuration for the placer module.

use serde::{Deserialize, Serialize};

/// Configuration for the local filesystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Whether to create missing parent directories of a destination.
    #[serde(default = "default_true")]
    pub create_parents: bool,

    /// How many `name_N.ext` candidates to try before giving up.
    #[serde(default = "default_max_rename_attempts")]
    pub max_rename_attempts: u32,
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_true() -> bool {
    true
}

fn default_max_rename_attempts() -> u32 {
    1000
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            create_parents: true,
            max_rename_attempts: default_max_rename_attempts(),
        }
    }
}

impl PlacerConfig {
    /// Sets the copy buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets whether parent directories are created.
    pub fn with_create_parents(mut self, create: bool) -> Self {
        self.create_parents = create;
        self
    }

    /// Sets the rename attempt limit.
    pub fn with_max_rename_attempts(mut self, attempts: u32) -> Self {
        self.max_rename_attempts = attempts;
        self
    }
}
