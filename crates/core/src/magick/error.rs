//! Error types for running ImageMagick commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The executable could not be found.
    #[error("executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// The process could not be started.
    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("process exited with code {code:?}{}", stderr_suffix(.stderr))]
    NonZeroExit {
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// The process exited zero but left no output file behind.
    #[error("expected output was not created: {path}")]
    OutputMissing { path: PathBuf },

    /// The process ran longer than the configured timeout.
    #[error("process timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The process output could not be interpreted.
    #[error("unrecognized process output: {output}")]
    UnrecognizedOutput { output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &Option<String>) -> String {
    stderr
        .as_deref()
        .map(|s| format!(": {}", s))
        .unwrap_or_default()
}

impl InvokeError {
    pub fn executable_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ExecutableNotFound { path: path.into() }
    }

    pub fn spawn(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            path: path.into(),
            source,
        }
    }

    pub fn non_zero_exit(code: Option<i32>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        let stderr = stderr.trim();
        Self::NonZeroExit {
            code,
            stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
        }
    }

    pub fn output_missing(path: impl Into<PathBuf>) -> Self {
        Self::OutputMissing { path: path.into() }
    }

    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }
}
