//! Types for the processor module.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::magick::{InvocationResult, VariantKind};
use crate::placer::TemporaryFileSet;

use super::error::PipelineError;

/// Observable state of a `DerivativeOrchestrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    NotStarted,
    /// The primary conversion has run.
    PrimaryRunning,
    /// Every enabled variant has run.
    VariantsRunning,
    Done,
}

/// Per-invocation results of one processor run.
#[derive(Debug)]
pub struct DerivativeOutcome {
    pub primary: InvocationResult,
    /// Results of enabled variants, in execution order.
    pub variants: Vec<(VariantKind, InvocationResult)>,
}

impl DerivativeOutcome {
    /// True when the primary and every enabled variant succeeded.
    ///
    /// Disabled variants have no entry and do not gate the result.
    pub fn succeeded(&self) -> bool {
        self.primary.succeeded && self.variants.iter().all(|(_, r)| r.succeeded)
    }

    pub fn variant(&self, kind: VariantKind) -> Option<&InvocationResult> {
        self.variants
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, r)| r)
    }

    /// Number of commands that were run.
    pub fn invocations(&self) -> usize {
        1 + self.variants.len()
    }

    /// Converts each failed invocation into a `ProcessInvocationFailed`.
    pub fn into_failures(self) -> Vec<PipelineError> {
        std::iter::once(self.primary)
            .chain(self.variants.into_iter().map(|(_, r)| r))
            .filter_map(|r| {
                let output = r.output;
                r.failure
                    .map(|source| PipelineError::invocation_failed(output, source))
            })
            .collect()
    }
}

/// Result of one `OptimizePipeline` run.
///
/// The scratch directory lives as long as the report. Dropping the report
/// removes it; relocated derivatives live outside it and survive.
#[derive(Debug)]
pub struct PipelineReport {
    pub image: PathBuf,
    /// True when every processor succeeded and the promotion worked.
    pub succeeded: bool,
    /// True when at least one processor succeeded.
    pub image_changed: bool,
    /// Working copy and every relocated derivative, in order.
    pub temporary_files: TemporaryFileSet,
    /// Derivatives placed next to the image.
    pub derivatives: Vec<PathBuf>,
    pub(crate) scratch: Option<TempDir>,
}

impl PipelineReport {
    pub(crate) fn empty(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            succeeded: false,
            image_changed: false,
            temporary_files: TemporaryFileSet::new(),
            derivatives: Vec::new(),
            scratch: None,
        }
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Removes the scratch directory now instead of on drop.
    pub fn cleanup(&mut self) -> std::io::Result<()> {
        match self.scratch.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magick::InvokeError;

    #[test]
    fn test_disabled_variants_do_not_gate() {
        let outcome = DerivativeOutcome {
            primary: InvocationResult::success("a.png"),
            variants: vec![],
        };
        assert!(outcome.succeeded());
        assert_eq!(outcome.invocations(), 1);
    }

    #[test]
    fn test_failed_variant_fails_outcome() {
        let outcome = DerivativeOutcome {
            primary: InvocationResult::success("a.png"),
            variants: vec![
                (VariantKind::Webp, InvocationResult::success("a.png.webp")),
                (
                    VariantKind::Avif,
                    InvocationResult::failure(
                        "a.png.avif",
                        InvokeError::non_zero_exit(Some(1), ""),
                    ),
                ),
            ],
        };

        assert!(!outcome.succeeded());
        assert!(outcome.variant(VariantKind::Webp).unwrap().succeeded);

        let failures = outcome.into_failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            PipelineError::ProcessInvocationFailed { output, .. } if output == Path::new("a.png.avif")
        ));
    }

    #[test]
    fn test_cleanup_removes_scratch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();
        let mut report = PipelineReport::empty("a.png");
        report.scratch = Some(dir);

        assert_eq!(report.scratch_dir(), Some(path.as_path()));
        report.cleanup().unwrap();
        assert!(!path.exists());
        assert!(report.scratch_dir().is_none());
    }
}
