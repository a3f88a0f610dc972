//! Trait definitions for the magick module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::types::{CommandSpec, InvocationResult};

/// Runs one external command to completion.
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    /// Returns the name of this invoker implementation.
    fn name(&self) -> &str;

    /// Runs the command and reports whether it produced its output.
    ///
    /// Failures are reported in the result, never as a panic or error.
    async fn run(&self, spec: &CommandSpec) -> InvocationResult;
}

/// Resolves a configured binary name or path to an executable file.
pub trait ExecutableLocator: Send + Sync {
    /// Returns the resolved path, or `None` when nothing executable is found.
    fn locate(&self, program: &Path) -> Option<PathBuf>;
}

/// Checks that a source image can be decoded.
#[async_trait]
pub trait ImageValidator: Send + Sync {
    async fn is_valid(&self, path: &Path) -> bool;
}
