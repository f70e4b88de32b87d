//! Error types for the watchdog engine.

use gcquake_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during watchdog operations.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// The dedicated action worker thread could not be created.
    #[error("Failed to spawn the corrective action worker: {source}")]
    WorkerSpawn {
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The action worker was already started for this monitor.
    #[error("Corrective action worker already started")]
    WorkerAlreadyStarted,

    /// The warning sentinel could not be touched.
    #[error("Failed to touch warning sentinel {}: {source}", .path.display())]
    Sentinel {
        /// Sentinel path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The signal number is not valid on this platform.
    #[error("Invalid signal number: {0}")]
    InvalidSignal(i32),

    /// The signal could not be delivered.
    #[error("Failed to deliver signal {signal}: {reason}")]
    SignalDelivery {
        /// Signal number.
        signal: i32,
        /// Reason reported by the platform.
        reason: String,
    },

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WatchdogError {
    /// Create a worker spawn error.
    #[must_use]
    pub fn worker_spawn(source: std::io::Error) -> Self {
        Self::WorkerSpawn { source }
    }

    /// Create a sentinel error.
    #[must_use]
    pub fn sentinel(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Sentinel {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid signal error.
    #[must_use]
    pub fn invalid_signal(signal: i32) -> Self {
        Self::InvalidSignal(signal)
    }

    /// Create a signal delivery error.
    #[must_use]
    pub fn signal_delivery(signal: i32, reason: impl Into<String>) -> Self {
        Self::SignalDelivery {
            signal,
            reason: reason.into(),
        }
    }
}

/// Result type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let err = WatchdogError::invalid_signal(999);
        assert_eq!(err.to_string(), "Invalid signal number: 999");

        let err = WatchdogError::signal_delivery(15, "EPERM");
        assert!(err.to_string().contains("15"));
        assert!(err.to_string().contains("EPERM"));
    }

    #[test]
    fn test_sentinel_error_has_source() {
        let err = WatchdogError::sentinel(
            "/nonexistent/warn",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/nonexistent/warn"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: WatchdogError = ConfigError::invalid_threshold("x").into();
        assert!(matches!(err, WatchdogError::Config(_)));
        assert!(err.to_string().contains("Invalid trigger threshold"));
    }
}
