//! Error types for the processor module.

use std::path::PathBuf;
use thiserror::Error;

use crate::magick::InvokeError;
use crate::placer::PlacerError;

/// Errors raised while optimizing one image.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source image could not be identified.
    #[error("invalid source image: {path}")]
    InvalidSourceImage { path: PathBuf },

    /// The conversion binary could not be resolved.
    #[error("executable not found: {path}")]
    ExecutableNotFound { path: PathBuf },

    /// One conversion failed.
    #[error("conversion to {output} failed: {source}")]
    ProcessInvocationFailed {
        output: PathBuf,
        #[source]
        source: InvokeError,
    },

    /// A finished output could not be copied to its destination.
    #[error("failed to relocate {from} to {destination}: {source}")]
    RelocationFailed {
        from: PathBuf,
        destination: PathBuf,
        #[source]
        source: PlacerError,
    },

    /// The working copy could not be created.
    #[error("failed to stage working copy of {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: PlacerError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn invocation_failed(output: impl Into<PathBuf>, source: InvokeError) -> Self {
        Self::ProcessInvocationFailed {
            output: output.into(),
            source,
        }
    }

    pub fn relocation_failed(
        from: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        source: PlacerError,
    ) -> Self {
        Self::RelocationFailed {
            from: from.into(),
            destination: destination.into(),
            source,
        }
    }

    /// Whether the error ends the whole run rather than one step of it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidSourceImage { .. }
                | Self::ExecutableNotFound { .. }
                | Self::Staging { .. }
                | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(PipelineError::InvalidSourceImage {
            path: PathBuf::from("x.jpg")
        }
        .is_fatal());
        assert!(PipelineError::ExecutableNotFound {
            path: PathBuf::from("convert")
        }
        .is_fatal());
        assert!(!PipelineError::invocation_failed(
            "x.jpg.webp",
            InvokeError::output_missing("x.jpg.webp")
        )
        .is_fatal());
        assert!(!PipelineError::relocation_failed(
            "a",
            "b",
            PlacerError::source_not_found("a")
        )
        .is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::invocation_failed(
            "/tmp/x.jpg.avif",
            InvokeError::non_zero_exit(Some(1), "no encode delegate for AVIF"),
        );
        assert_eq!(
            err.to_string(),
            "conversion to /tmp/x.jpg.avif failed: process exited with code Some(1): no encode delegate for AVIF"
        );
    }
}
