//! One-shot cross-thread trigger.
//!
//! ```text
//! ┌──────┐  arm()  ┌───────┐  await_trigger() / try_fire()  ┌───────┐
//! │ Idle │────────►│ Armed │───────────────────────────────►│ Fired │
//! └──────┘         └───────┘                                └───────┘
//! ```
//!
//! Transitions only move forward. `Armed → Fired` happens exactly once, so
//! exactly one consumer ever acts on a trigger.

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

/// Trigger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TriggerState {
    /// Nothing requested.
    #[default]
    Idle,
    /// Action requested, not yet claimed.
    Armed,
    /// Action claimed by a consumer.
    Fired,
}

/// Result of [`TriggerGate::arm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArmOutcome {
    /// This call armed the gate.
    Armed,
    /// The gate was already armed; no-op.
    AlreadyArmed,
    /// The action was already claimed; no-op.
    AlreadyFired,
}

/// Mutex/condvar pair carrying the trigger from event threads to the worker.
#[derive(Debug, Default)]
pub struct TriggerGate {
    state: Mutex<TriggerState>,
    armed: Condvar,
}

impl TriggerGate {
    /// Create an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the action.
    pub fn arm(&self) -> ArmOutcome {
        let mut state = self.state.lock();
        match *state {
            TriggerState::Idle => {
                *state = TriggerState::Armed;
                self.armed.notify_all();
                ArmOutcome::Armed
            }
            TriggerState::Armed => ArmOutcome::AlreadyArmed,
            TriggerState::Fired => ArmOutcome::AlreadyFired,
        }
    }

    /// Block until the gate is armed, then try to claim it.
    ///
    /// Returns `true` only for the caller that moved the gate to `Fired`.
    /// A caller that wakes to find it already fired gets `false` and must
    /// not act.
    pub fn await_trigger(&self) -> bool {
        let mut state = self.state.lock();
        while *state == TriggerState::Idle {
            self.armed.wait(&mut state);
        }
        Self::claim(&mut state)
    }

    /// Claim an armed gate without blocking.
    pub fn try_fire(&self) -> bool {
        let mut state = self.state.lock();
        Self::claim(&mut state)
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> TriggerState {
        *self.state.lock()
    }

    fn claim(state: &mut TriggerState) -> bool {
        if *state == TriggerState::Armed {
            *state = TriggerState::Fired;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_arm_transitions() {
        let gate = TriggerGate::new();
        assert_eq!(gate.state(), TriggerState::Idle);
        assert_eq!(gate.arm(), ArmOutcome::Armed);
        assert_eq!(gate.arm(), ArmOutcome::AlreadyArmed);
        assert!(gate.try_fire());
        assert_eq!(gate.arm(), ArmOutcome::AlreadyFired);
        assert_eq!(gate.state(), TriggerState::Fired);
    }

    #[test]
    fn test_try_fire_requires_armed() {
        let gate = TriggerGate::new();
        assert!(!gate.try_fire());
        gate.arm();
        assert!(gate.try_fire());
        assert!(!gate.try_fire());
    }

    #[test]
    fn test_await_returns_immediately_when_armed() {
        let gate = TriggerGate::new();
        gate.arm();
        assert!(gate.await_trigger());
        assert!(!gate.await_trigger());
    }

    #[test]
    fn test_waiter_wakes_on_arm() {
        let gate = Arc::new(TriggerGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.await_trigger())
        };
        gate.arm();
        assert!(matches!(waiter.join(), Ok(true)));
        assert_eq!(gate.state(), TriggerState::Fired);
    }
}
