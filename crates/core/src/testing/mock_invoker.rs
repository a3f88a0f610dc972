//! Mock process invoker for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::magick::{CommandSpec, InvocationResult, InvokeError, ProcessInvoker};

/// Mock implementation of the ProcessInvoker trait.
///
/// Records every command and succeeds unless the output path ends with one
/// of the configured failure suffixes. Clones share their state.
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    invocations: Arc<RwLock<Vec<CommandSpec>>>,
    fail_suffixes: Arc<RwLock<Vec<String>>>,
    create_outputs: Arc<RwLock<bool>>,
}

impl MockInvoker {
    /// Create a new mock invoker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command whose output path ends with `suffix`.
    pub async fn fail_outputs_ending_with(&self, suffix: impl Into<String>) {
        self.fail_suffixes.write().await.push(suffix.into());
    }

    /// Write the output file of each successful command to disk.
    pub async fn set_create_outputs(&self, create: bool) {
        *self.create_outputs.write().await = create;
    }

    /// Get all recorded commands, in order.
    pub async fn recorded_invocations(&self) -> Vec<CommandSpec> {
        self.invocations.read().await.clone()
    }

    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    pub async fn clear(&self) {
        self.invocations.write().await.clear();
    }
}

#[async_trait]
impl ProcessInvoker for MockInvoker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, spec: &CommandSpec) -> InvocationResult {
        self.invocations.write().await.push(spec.clone());

        let output = spec.output().to_string_lossy().into_owned();
        let fails = self
            .fail_suffixes
            .read()
            .await
            .iter()
            .any(|suffix| output.ends_with(suffix.as_str()));
        if fails {
            return InvocationResult::failure(
                spec.output(),
                InvokeError::non_zero_exit(Some(1), "mock failure"),
            );
        }

        if *self.create_outputs.read().await {
            if let Err(e) = tokio::fs::write(spec.output(), b"mock output").await {
                return InvocationResult::failure(spec.output(), InvokeError::Io(e));
            }
        }

        InvocationResult::success(spec.output())
    }
}
