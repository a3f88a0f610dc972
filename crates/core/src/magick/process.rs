//! Process invoker backed by `tokio::process`.

use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::MagickConfig;
use super::error::InvokeError;
use super::traits::ProcessInvoker;
use super::types::{CommandSpec, InvocationResult};

/// Runs ImageMagick commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct MagickInvoker {
    timeout: Option<Duration>,
}

impl MagickInvoker {
    pub fn new(config: &MagickConfig) -> Self {
        Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Invoker without a timeout.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn execute(&self, spec: &CommandSpec) -> Result<(), InvokeError> {
        debug!("Running: {}", spec.to_shell_string());

        let output = capture(spec.executable(), spec.args(), self.timeout).await?;

        if !output.status.success() {
            return Err(InvokeError::non_zero_exit(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        tokio::fs::metadata(spec.output())
            .await
            .map_err(|_| InvokeError::output_missing(spec.output()))?;

        Ok(())
    }
}

#[async_trait]
impl ProcessInvoker for MagickInvoker {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, spec: &CommandSpec) -> InvocationResult {
        InvocationResult::from_result(spec.output(), self.execute(spec).await)
    }
}

/// Runs a program to completion and captures its stdout and stderr.
///
/// The child is killed when the timeout expires.
pub(crate) async fn capture(
    program: &Path,
    args: &[String],
    limit: Option<Duration>,
) -> Result<Output, InvokeError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InvokeError::executable_not_found(program)
            } else {
                InvokeError::spawn(program, e)
            }
        })?;

    match limit {
        Some(limit) => match timeout(limit, child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            // Dropping the future drops the child, which kills it.
            Err(_) => Err(InvokeError::timeout(limit.as_secs())),
        },
        None => Ok(child.wait_with_output().await?),
    }
}
