//! Corrective action descriptors.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// The corrective action taken once the watchdog trips.
///
/// Every variant ends the process through at least one path; signal
/// delivery is always followed by an unblockable kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Allocate until the host allocator fails, so the host's own
    /// out-of-memory handling (heap dumps, hooks) runs.
    #[default]
    ForceAllocationExhaustion,
    /// Raise `SIGABRT` to leave a core dump for postmortem analysis.
    AbortWithCoreDump,
    /// Raise `SIGKILL`; no cleanup of any kind.
    ImmediateTerminate,
    /// Deliver the given signal, then `SIGKILL` as a fallback.
    DeliverSignal(i32),
}

impl ActionKind {
    /// Parse an action selector from the option string.
    ///
    /// `0` selects [`ActionKind::ForceAllocationExhaustion`], any positive
    /// integer selects [`ActionKind::DeliverSignal`]. The names `OOM`,
    /// `ABORT` and `KILL` are accepted in any case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidActionSelector`] for negative numbers
    /// and unknown names.
    pub fn from_selector(selector: &str) -> ConfigResult<Self> {
        let trimmed = selector.trim();
        if let Ok(number) = trimmed.parse::<i32>() {
            return match number {
                0 => Ok(Self::ForceAllocationExhaustion),
                n if n > 0 => Ok(Self::DeliverSignal(n)),
                _ => Err(ConfigError::invalid_action_selector(trimmed)),
            };
        }

        match trimmed.to_ascii_uppercase().as_str() {
            "OOM" => Ok(Self::ForceAllocationExhaustion),
            "ABORT" => Ok(Self::AbortWithCoreDump),
            "KILL" => Ok(Self::ImmediateTerminate),
            _ => Err(ConfigError::invalid_action_selector(trimmed)),
        }
    }

    /// Whether the action has to run on a thread distinct from the one
    /// reporting reclamation events.
    #[must_use]
    pub fn requires_worker(self) -> bool {
        matches!(self, Self::ForceAllocationExhaustion)
    }

    /// The signal delivered first, if any.
    #[must_use]
    pub fn signal(self) -> Option<i32> {
        match self {
            Self::DeliverSignal(signal) => Some(signal),
            _ => None,
        }
    }
}

impl FromStr for ActionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_selector(s)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ForceAllocationExhaustion => write!(f, "force allocation exhaustion"),
            Self::AbortWithCoreDump => write!(f, "abort with core dump"),
            Self::ImmediateTerminate => write!(f, "immediate terminate"),
            Self::DeliverSignal(signal) => write!(f, "signal {signal}"),
        }
    }
}
