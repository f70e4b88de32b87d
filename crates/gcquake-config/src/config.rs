//! Immutable watchdog configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::action::ActionKind;
use crate::error::{ConfigError, ConfigResult};

/// Default trigger threshold in seconds.
pub const DEFAULT_TRIGGER_THRESHOLD_SECS: u64 = 30;

/// Default idle weight; a target reclamation duty cycle of 1/(5+1).
pub const DEFAULT_IDLE_WEIGHT: u32 = 5;

/// Sentinel touched when the warning threshold is crossed and no `touch=`
/// path was given.
pub const DEFAULT_WARNING_SINK: &str = "/tmp/gcquake_warn_gc";

/// Watchdog configuration, resolved once at startup.
///
/// Construct it with [`WatchdogConfig::parse`] from the host's option
/// string, leniently with [`WatchdogConfig::from_options`], or with the
/// [`WatchdogConfig::builder`]. All constructors validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Debt above which the corrective action is armed.
    pub trigger_threshold: Duration,
    /// Multiplier applied to idle time when draining debt (>= 1).
    pub idle_weight: u32,
    /// Debt above which the warning sink is notified.
    pub warning_threshold: Option<Duration>,
    /// Corrective action.
    pub action: ActionKind,
    /// Sentinel path for the warning sink.
    pub warning_sink: Option<PathBuf>,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            trigger_threshold: Duration::from_secs(DEFAULT_TRIGGER_THRESHOLD_SECS),
            idle_weight: DEFAULT_IDLE_WEIGHT,
            warning_threshold: None,
            action: ActionKind::ForceAllocationExhaustion,
            warning_sink: None,
        }
    }
}

impl WatchdogConfig {
    /// Parse a host option string strictly.
    ///
    /// Format: `<threshold_secs>,<idle_weight>,<action>[,key=value...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if any positional field or keyword value is
    /// malformed, or if the resulting configuration fails validation.
    pub fn parse(options: &str) -> ConfigResult<Self> {
        crate::options::parse_options(options)
    }

    /// Resolve the configuration from an optional host option string.
    ///
    /// Absent or blank options yield the defaults silently. Malformed
    /// options are logged and also yield the defaults; the watchdog keeps
    /// running rather than refusing to start.
    #[must_use]
    pub fn from_options(options: Option<&str>) -> Self {
        let Some(raw) = options.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };

        match Self::parse(raw) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(
                    options = raw,
                    error = %error,
                    "Malformed watchdog options, falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.trigger_threshold.is_zero() {
            return Err(ConfigError::invalid_configuration(
                "trigger_threshold must be greater than 0",
            ));
        }
        if self.idle_weight == 0 {
            return Err(ConfigError::invalid_configuration(
                "idle_weight must be at least 1",
            ));
        }
        if let Some(warning) = self.warning_threshold {
            if warning >= self.trigger_threshold {
                return Err(ConfigError::invalid_configuration(
                    "warning_threshold must be below trigger_threshold",
                ));
            }
        }
        if let Some(path) = &self.warning_sink {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid_configuration(
                    "warning sink path must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// The sentinel path to touch on warnings, when warnings are enabled.
    #[must_use]
    pub fn warning_target(&self) -> Option<&Path> {
        self.warning_threshold?;
        Some(
            self.warning_sink
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_WARNING_SINK)),
        )
    }
}

impl FromStr for WatchdogConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for WatchdogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "threshold=[{:?}],runtime_weight=[{}:1],action=[{}]",
            self.trigger_threshold, self.idle_weight, self.action
        )?;
        if let (Some(warning), Some(target)) = (self.warning_threshold, self.warning_target()) {
            write!(
                f,
                ",warn_threshold=[{warning:?}],touch_path=[{}]",
                target.display()
            )?;
        }
        Ok(())
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the trigger threshold.
    #[must_use]
    pub fn trigger_threshold(mut self, threshold: Duration) -> Self {
        self.config.trigger_threshold = threshold;
        self
    }

    /// Set the trigger threshold in whole seconds.
    #[must_use]
    pub fn trigger_threshold_secs(self, secs: u64) -> Self {
        self.trigger_threshold(Duration::from_secs(secs))
    }

    /// Set the idle weight.
    #[must_use]
    pub fn idle_weight(mut self, weight: u32) -> Self {
        self.config.idle_weight = weight;
        self
    }

    /// Set the warning threshold.
    #[must_use]
    pub fn warning_threshold(mut self, threshold: Duration) -> Self {
        self.config.warning_threshold = Some(threshold);
        self
    }

    /// Set the warning threshold in whole seconds.
    #[must_use]
    pub fn warning_threshold_secs(self, secs: u64) -> Self {
        self.warning_threshold(Duration::from_secs(secs))
    }

    /// Set the corrective action.
    #[must_use]
    pub fn action(mut self, action: ActionKind) -> Self {
        self.config.action = action;
        self
    }

    /// Set the sentinel path touched on warnings.
    #[must_use]
    pub fn warning_sink(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.warning_sink = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> ConfigResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatchdogConfig::default();
        assert_eq!(config.trigger_threshold, Duration::from_secs(30));
        assert_eq!(config.idle_weight, 5);
        assert_eq!(config.action, ActionKind::ForceAllocationExhaustion);
        assert!(config.warning_threshold.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = WatchdogConfig {
            idle_weight: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WatchdogConfig {
            trigger_threshold: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WatchdogConfig {
            warning_threshold: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let result = WatchdogConfig::builder()
            .trigger_threshold_secs(60)
            .idle_weight(9)
            .warning_threshold_secs(45)
            .action(ActionKind::DeliverSignal(15))
            .warning_sink("/var/run/app/gc_warn")
            .build();
        assert!(result.is_ok());
        if let Ok(config) = result {
            assert_eq!(config.trigger_threshold, Duration::from_secs(60));
            assert_eq!(config.idle_weight, 9);
            assert_eq!(config.warning_threshold, Some(Duration::from_secs(45)));
            assert_eq!(
                config.warning_target(),
                Some(Path::new("/var/run/app/gc_warn"))
            );
        }
    }

    #[test]
    fn test_warning_target_defaults_when_warning_enabled() {
        let config = WatchdogConfig {
            warning_threshold: Some(Duration::from_secs(20)),
            ..Default::default()
        };
        assert_eq!(config.warning_target(), Some(Path::new(DEFAULT_WARNING_SINK)));

        let config = WatchdogConfig {
            warning_sink: Some(PathBuf::from("/tmp/unused")),
            ..Default::default()
        };
        assert_eq!(config.warning_target(), None);
    }

    #[test]
    fn test_from_options_blank_is_default() {
        assert_eq!(WatchdogConfig::from_options(None), WatchdogConfig::default());
        assert_eq!(
            WatchdogConfig::from_options(Some("   ")),
            WatchdogConfig::default()
        );
    }
}
