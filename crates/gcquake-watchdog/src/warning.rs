//! Early-warning notifications.

use filetime::FileTime;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{WatchdogError, WatchdogResult};

/// A warning-threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningEvent {
    /// Debt when the crossing was observed.
    pub debt: Duration,
    /// The warning threshold that was crossed.
    pub threshold: Duration,
}

/// Receives warning-threshold crossings.
///
/// Called on the event-reporting thread, outside the watchdog's locks, at
/// most once per crossing.
pub trait WarningSink: Send + Sync {
    /// Handle a crossing. Must not panic; failures are the sink's to log.
    fn notify(&self, event: &WarningEvent);
}

impl<F> WarningSink for F
where
    F: Fn(&WarningEvent) + Send + Sync,
{
    fn notify(&self, event: &WarningEvent) {
        self(event);
    }
}

/// Signals a crossing by updating a file's modification time.
///
/// External health checks can watch the file instead of parsing logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelFile {
    path: PathBuf,
}

impl SentinelFile {
    /// Create a sentinel at `path`. Nothing is touched until a crossing.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sentinel path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file if missing and set its modification time to now.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Sentinel`] if the file cannot be opened or
    /// its times cannot be set.
    pub fn touch(&self) -> WatchdogResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|source| WatchdogError::sentinel(&self.path, source))?;
        filetime::set_file_handle_times(&file, None, Some(FileTime::now()))
            .map_err(|source| WatchdogError::sentinel(&self.path, source))
    }
}

impl WarningSink for SentinelFile {
    fn notify(&self, event: &WarningEvent) {
        tracing::warn!(
            debt = ?event.debt,
            threshold = ?event.threshold,
            path = %self.path.display(),
            "Reclamation debt crossed warning threshold"
        );
        if let Err(error) = self.touch() {
            tracing::warn!(%error, "Could not touch warning sentinel");
        }
    }
}
