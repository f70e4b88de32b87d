//! Warning sinks for assertions.

use gcquake_watchdog::warning::{WarningEvent, WarningSink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts warning notifications and keeps the latest event.
#[derive(Debug, Default)]
pub struct CountingSink {
    count: AtomicU64,
    last: Mutex<Option<WarningEvent>>,
}

impl CountingSink {
    /// Create a sink with no notifications.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of notifications so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    /// Most recent event.
    #[must_use]
    pub fn last(&self) -> Option<WarningEvent> {
        *self.last.lock()
    }
}

impl WarningSink for CountingSink {
    fn notify(&self, event: &WarningEvent) {
        *self.last.lock() = Some(*event);
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
