//! Sequencing of the primary and variant conversions.

use std::mem;
use std::sync::Arc;
use tracing::debug;

use crate::magick::{CommandSet, InvocationResult, ProcessInvoker, VariantKind};

use super::types::{DerivativeOutcome, OrchestratorState};

enum Stage {
    NotStarted,
    PrimaryRunning {
        primary: InvocationResult,
    },
    VariantsRunning {
        primary: InvocationResult,
        variants: Vec<(VariantKind, InvocationResult)>,
    },
    Done(DerivativeOutcome),
}

/// Runs the commands of one `CommandSet`.
///
/// The primary command always runs first. Enabled variants follow in
/// `webp`, `avif` order whatever the primary outcome was. Every invocation
/// is awaited before the next starts.
pub struct DerivativeOrchestrator {
    commands: CommandSet,
    invoker: Arc<dyn ProcessInvoker>,
    stage: Stage,
}

impl DerivativeOrchestrator {
    pub fn new(commands: CommandSet, invoker: Arc<dyn ProcessInvoker>) -> Self {
        Self {
            commands,
            invoker,
            stage: Stage::NotStarted,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        match self.stage {
            Stage::NotStarted => OrchestratorState::NotStarted,
            Stage::PrimaryRunning { .. } => OrchestratorState::PrimaryRunning,
            Stage::VariantsRunning { .. } => OrchestratorState::VariantsRunning,
            Stage::Done(_) => OrchestratorState::Done,
        }
    }

    /// The aggregate outcome, once `Done`.
    pub fn outcome(&self) -> Option<&DerivativeOutcome> {
        match &self.stage {
            Stage::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Performs exactly one transition. Does nothing once `Done`.
    ///
    /// Cancel-safe: the stage only changes after the step's invocations have
    /// finished, so a dropped call leaves the previous stage in place and the
    /// interrupted step runs again on the next call.
    pub async fn advance(&mut self) {
        match &self.stage {
            Stage::NotStarted => {
                let primary = self.invoker.run(self.commands.primary()).await;
                debug!(
                    "Primary conversion of {:?}: {}",
                    primary.output,
                    status(&primary)
                );
                self.stage = Stage::PrimaryRunning { primary };
            }
            Stage::PrimaryRunning { .. } => {
                let mut variants = Vec::new();
                for (kind, spec) in self.commands.variants() {
                    let result = self.invoker.run(spec).await;
                    debug!("{} conversion of {:?}: {}", kind, result.output, status(&result));
                    variants.push((kind, result));
                }
                if let Stage::PrimaryRunning { primary } =
                    mem::replace(&mut self.stage, Stage::NotStarted)
                {
                    self.stage = Stage::VariantsRunning { primary, variants };
                }
            }
            Stage::VariantsRunning { .. } => {
                if let Stage::VariantsRunning { primary, variants } =
                    mem::replace(&mut self.stage, Stage::NotStarted)
                {
                    self.stage = Stage::Done(DerivativeOutcome { primary, variants });
                }
            }
            Stage::Done(_) => {}
        }
    }

    /// Advances until `Done` and returns the outcome.
    pub async fn run(mut self) -> DerivativeOutcome {
        loop {
            if let Stage::Done(outcome) = self.stage {
                return outcome;
            }
            self.advance().await;
        }
    }
}

fn status(result: &InvocationResult) -> &'static str {
    if result.succeeded {
        "ok"
    } else {
        "failed"
    }
}
