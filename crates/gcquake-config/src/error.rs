//! Error types for option parsing and configuration validation.

use thiserror::Error;

/// Errors that can occur while parsing or validating watchdog options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The trigger threshold field is not a non-negative integer.
    #[error("Invalid trigger threshold '{0}': expected whole seconds")]
    InvalidThreshold(String),

    /// The idle weight field is not an integer.
    #[error("Invalid idle weight '{0}': expected a positive integer")]
    InvalidIdleWeight(String),

    /// The action selector is neither a signal number nor a known name.
    #[error("Invalid action selector '{0}': expected 0, a signal number, OOM, ABORT or KILL")]
    InvalidActionSelector(String),

    /// The `warn=` keyword value is not a non-negative integer.
    #[error("Invalid warning threshold '{0}': expected whole seconds")]
    InvalidWarningThreshold(String),

    /// A value parsed but the resulting configuration is not usable.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ConfigError {
    /// Create an invalid threshold error.
    #[must_use]
    pub fn invalid_threshold(raw: impl Into<String>) -> Self {
        Self::InvalidThreshold(raw.into())
    }

    /// Create an invalid idle weight error.
    #[must_use]
    pub fn invalid_idle_weight(raw: impl Into<String>) -> Self {
        Self::InvalidIdleWeight(raw.into())
    }

    /// Create an invalid action selector error.
    #[must_use]
    pub fn invalid_action_selector(raw: impl Into<String>) -> Self {
        Self::InvalidActionSelector(raw.into())
    }

    /// Create an invalid warning threshold error.
    #[must_use]
    pub fn invalid_warning_threshold(raw: impl Into<String>) -> Self {
        Self::InvalidWarningThreshold(raw.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

/// A specialized `Result` type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
