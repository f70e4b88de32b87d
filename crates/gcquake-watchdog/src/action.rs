//! Corrective action plans.

use gcquake_config::ActionKind;
use std::sync::Arc;

use crate::process::{CurrentProcess, ProcessControl};

/// Runs corrective actions against a [`ProcessControl`].
///
/// Every plan ends with [`ProcessControl::kill`], so a signal that is
/// blocked, handled or ignored still ends the process.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    process: Arc<dyn ProcessControl>,
}

impl ActionExecutor {
    /// Create an executor acting through `process`.
    #[must_use]
    pub fn new(process: Arc<dyn ProcessControl>) -> Self {
        Self { process }
    }

    /// Create an executor acting on the running process.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Arc::new(CurrentProcess))
    }

    /// The process this executor acts on.
    #[must_use]
    pub fn process(&self) -> &Arc<dyn ProcessControl> {
        &self.process
    }

    /// Run the plan for a tripped threshold.
    pub fn fire(&self, action: ActionKind) {
        tracing::error!(%action, "Executing corrective action");
        match action {
            ActionKind::ForceAllocationExhaustion => self.process.exhaust_memory(),
            ActionKind::AbortWithCoreDump => self.process.abort(),
            ActionKind::ImmediateTerminate => {}
            ActionKind::DeliverSignal(signal) => self.deliver(signal),
        }
        self.process.kill();
    }

    /// Run the plan for a resource-exhaustion notification.
    ///
    /// The host's own out-of-memory handling has already run by the time it
    /// reports exhaustion, so forced allocation exhaustion reduces to a
    /// kill.
    pub fn fire_exhausted(&self, action: ActionKind) {
        match action {
            ActionKind::DeliverSignal(signal) => self.deliver(signal),
            ActionKind::AbortWithCoreDump => self.process.abort(),
            ActionKind::ImmediateTerminate | ActionKind::ForceAllocationExhaustion => {}
        }
        self.process.kill();
    }

    /// Terminate after an unrecoverable watchdog failure, leaving a core
    /// dump when possible.
    pub fn fatal(&self, reason: &str) {
        tracing::error!(reason, "Unrecoverable watchdog failure, aborting");
        self.process.abort();
        self.process.kill();
    }

    fn deliver(&self, signal: i32) {
        tracing::error!(signal, "Delivering signal");
        if let Err(error) = self.process.deliver(signal) {
            tracing::error!(signal, %error, "Signal delivery failed, falling back to kill");
        }
    }
}
