//! Process-level termination primitives.
//!
//! [`ProcessControl`] is the seam between the action plans and the process
//! they act on. [`CurrentProcess`] acts on the running process;
//! [`RecordingProcess`] only records what it was asked to do. Hosts with
//! their own out-of-memory machinery implement the trait to replace
//! [`ProcessControl::exhaust_memory`].

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

use crate::error::WatchdogResult;

/// Primitive operations an action plan is built from.
pub trait ProcessControl: Send + Sync + Debug {
    /// Deliver `signal` to the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal number is invalid or delivery fails.
    fn deliver(&self, signal: i32) -> WatchdogResult<()>;

    /// Terminate with `SIGKILL`. Does not return in production.
    fn kill(&self);

    /// Terminate with `SIGABRT`, leaving a core dump. Does not return in
    /// production.
    fn abort(&self);

    /// Allocate until the allocator fails. Does not return in production.
    fn exhaust_memory(&self);
}

/// The running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrentProcess;

/// Size of each block [`CurrentProcess::exhaust_memory`] claims, in `u64`s
/// (`i32::MAX` elements, just under 16 GiB).
pub const EXHAUSTION_BLOCK_LEN: usize = 0x7FFF_FFFF;

#[cfg(unix)]
impl ProcessControl for CurrentProcess {
    fn deliver(&self, signal: i32) -> WatchdogResult<()> {
        use crate::error::WatchdogError;
        use nix::sys::signal::{Signal, raise};

        let sig = Signal::try_from(signal)
            .ok()
            .ok_or_else(|| WatchdogError::invalid_signal(signal))?;
        raise(sig).map_err(|errno| WatchdogError::signal_delivery(signal, errno.desc()))
    }

    fn kill(&self) {
        use nix::sys::signal::{Signal, raise};

        if let Err(errno) = raise(Signal::SIGKILL) {
            tracing::error!(error = %errno, "Failed to raise SIGKILL, aborting instead");
        }
        std::process::abort();
    }

    fn abort(&self) {
        use nix::sys::signal::{Signal, raise};

        if let Err(errno) = raise(Signal::SIGABRT) {
            tracing::error!(error = %errno, "Failed to raise SIGABRT");
        }
        std::process::abort();
    }

    fn exhaust_memory(&self) {
        exhaust_allocator();
    }
}

#[cfg(not(unix))]
impl ProcessControl for CurrentProcess {
    fn deliver(&self, signal: i32) -> WatchdogResult<()> {
        Err(crate::error::WatchdogError::signal_delivery(
            signal,
            "signals are not supported on this platform",
        ))
    }

    fn kill(&self) {
        std::process::abort();
    }

    fn abort(&self) {
        std::process::abort();
    }

    fn exhaust_memory(&self) {
        exhaust_allocator();
    }
}

fn exhaust_allocator() -> ! {
    use std::alloc::{Layout, handle_alloc_error};

    tracing::error!(
        block_bytes = EXHAUSTION_BLOCK_LEN.saturating_mul(size_of::<u64>()),
        "Forcing allocation exhaustion"
    );
    loop {
        let mut block: Vec<u64> = Vec::new();
        if block.try_reserve_exact(EXHAUSTION_BLOCK_LEN).is_err() {
            match Layout::array::<u64>(EXHAUSTION_BLOCK_LEN) {
                Ok(layout) => handle_alloc_error(layout),
                Err(_) => std::process::abort(),
            }
        }
        // Touch every page so overcommit cannot hide the allocation.
        block.resize(EXHAUSTION_BLOCK_LEN, 0);
        std::hint::black_box(block.leak());
    }
}

/// A step requested from a [`RecordingProcess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessStep {
    /// `deliver(signal)`.
    Deliver(i32),
    /// `kill()`.
    Kill,
    /// `abort()`.
    Abort,
    /// `exhaust_memory()`.
    ExhaustMemory,
}

/// A process stand-in that records steps instead of performing them.
///
/// Signal numbers are validated the same way [`CurrentProcess`] validates
/// them, so an invalid number is recorded and reported as an error.
#[derive(Debug, Default)]
pub struct RecordingProcess {
    steps: Mutex<Vec<ProcessStep>>,
    recorded: Condvar,
}

impl RecordingProcess {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps recorded so far, in order.
    #[must_use]
    pub fn steps(&self) -> Vec<ProcessStep> {
        self.steps.lock().clone()
    }

    /// Wait until at least `count` steps are recorded.
    ///
    /// Returns `false` on timeout.
    pub fn wait_for_steps(&self, count: usize, timeout: Duration) -> bool {
        let mut steps = self.steps.lock();
        while steps.len() < count {
            if self.recorded.wait_for(&mut steps, timeout).timed_out() {
                return steps.len() >= count;
            }
        }
        true
    }

    fn record(&self, step: ProcessStep) {
        self.steps.lock().push(step);
        self.recorded.notify_all();
    }
}

impl ProcessControl for RecordingProcess {
    fn deliver(&self, signal: i32) -> WatchdogResult<()> {
        self.record(ProcessStep::Deliver(signal));
        validate_signal(signal)
    }

    fn kill(&self) {
        self.record(ProcessStep::Kill);
    }

    fn abort(&self) {
        self.record(ProcessStep::Abort);
    }

    fn exhaust_memory(&self) {
        self.record(ProcessStep::ExhaustMemory);
    }
}

#[cfg(unix)]
fn validate_signal(signal: i32) -> WatchdogResult<()> {
    nix::sys::signal::Signal::try_from(signal)
        .map(drop)
        .ok()
        .ok_or_else(|| crate::error::WatchdogError::invalid_signal(signal))
}

#[cfg(not(unix))]
fn validate_signal(signal: i32) -> WatchdogResult<()> {
    if signal > 0 {
        Ok(())
    } else {
        Err(crate::error::WatchdogError::invalid_signal(signal))
    }
}
