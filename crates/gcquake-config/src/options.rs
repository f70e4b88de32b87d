//! Host option string parsing.
//!
//! The host hands the watchdog one comma-separated string:
//!
//! ```text
//! <threshold_secs>,<idle_weight>,<action>[,warn=<secs>][,touch=<path>]
//! ```
//!
//! Fields are trimmed. Missing or empty positional fields keep their
//! defaults. Unknown keywords and entries without `=` are logged and
//! skipped.

use std::time::Duration;

use crate::action::ActionKind;
use crate::config::{DEFAULT_WARNING_SINK, WatchdogConfig};
use crate::error::{ConfigError, ConfigResult};

const WARN_KEY: &str = "warn";
const TOUCH_KEY: &str = "touch";

pub(crate) fn parse_options(raw: &str) -> ConfigResult<WatchdogConfig> {
    let mut config = WatchdogConfig::default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(config);
    }

    let mut fields = raw.split(',').map(str::trim);

    if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
        config.trigger_threshold =
            parse_seconds(field).ok_or_else(|| ConfigError::invalid_threshold(field))?;
    }
    if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
        config.idle_weight = field
            .parse::<u32>()
            .ok()
            .ok_or_else(|| ConfigError::invalid_idle_weight(field))?;
    }
    if let Some(field) = fields.next().filter(|f| !f.is_empty()) {
        config.action = ActionKind::from_selector(field)?;
    }

    for entry in fields.filter(|f| !f.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            tracing::warn!(entry, "Ignoring watchdog option without '='");
            continue;
        };
        let value = value.trim();
        match key.trim() {
            WARN_KEY => {
                let warning = parse_seconds(value)
                    .ok_or_else(|| ConfigError::invalid_warning_threshold(value))?;
                config.warning_threshold = Some(warning);
            }
            TOUCH_KEY => {
                if value.is_empty() {
                    return Err(ConfigError::invalid_configuration("touch= requires a path"));
                }
                config.warning_sink = Some(value.into());
            }
            other => {
                tracing::warn!(key = other, "Ignoring unknown watchdog option");
            }
        }
    }

    if config.warning_threshold.is_some() && config.warning_sink.is_none() {
        config.warning_sink = Some(DEFAULT_WARNING_SINK.into());
    }

    config.validate()?;
    Ok(config)
}

fn parse_seconds(field: &str) -> Option<Duration> {
    field.parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_full_positional_string() -> ConfigResult<()> {
        let config = parse_options("60,9,15")?;
        assert_eq!(config.trigger_threshold, Duration::from_secs(60));
        assert_eq!(config.idle_weight, 9);
        assert_eq!(config.action, ActionKind::DeliverSignal(15));
        assert!(config.warning_threshold.is_none());
        Ok(())
    }

    #[test]
    fn test_trailing_fields_default() -> ConfigResult<()> {
        let config = parse_options("10")?;
        assert_eq!(config.trigger_threshold, Duration::from_secs(10));
        assert_eq!(config.idle_weight, 5);
        assert_eq!(config.action, ActionKind::ForceAllocationExhaustion);

        let config = parse_options(" 10 , 2 ")?;
        assert_eq!(config.idle_weight, 2);
        Ok(())
    }

    #[test]
    fn test_empty_positional_keeps_default() -> ConfigResult<()> {
        let config = parse_options(",,KILL")?;
        assert_eq!(config.trigger_threshold, Duration::from_secs(30));
        assert_eq!(config.idle_weight, 5);
        assert_eq!(config.action, ActionKind::ImmediateTerminate);
        Ok(())
    }

    #[test]
    fn test_keyword_arguments() -> ConfigResult<()> {
        let config = parse_options("30,5,0,warn=20,touch=/tmp/app_gc_warn")?;
        assert_eq!(config.warning_threshold, Some(Duration::from_secs(20)));
        assert_eq!(config.warning_target(), Some(Path::new("/tmp/app_gc_warn")));
        Ok(())
    }

    #[test]
    fn test_warn_without_touch_uses_default_sink() -> ConfigResult<()> {
        let config = parse_options("30,5,0,warn=20")?;
        assert_eq!(config.warning_target(), Some(Path::new(DEFAULT_WARNING_SINK)));
        Ok(())
    }

    #[test]
    fn test_unknown_and_bare_keywords_are_skipped() -> ConfigResult<()> {
        let config = parse_options("30,5,0,verbose,color=red,warn=10")?;
        assert_eq!(config.warning_threshold, Some(Duration::from_secs(10)));
        Ok(())
    }

    #[test]
    fn test_malformed_fields() {
        assert_eq!(
            parse_options("abc,5,0"),
            Err(ConfigError::invalid_threshold("abc"))
        );
        assert_eq!(
            parse_options("30,-1,0"),
            Err(ConfigError::invalid_idle_weight("-1"))
        );
        assert_eq!(
            parse_options("30,5,-9"),
            Err(ConfigError::invalid_action_selector("-9"))
        );
        assert_eq!(
            parse_options("30,5,0,warn=soon"),
            Err(ConfigError::invalid_warning_threshold("soon"))
        );
    }

    #[test]
    fn test_validation_after_parse() {
        assert!(matches!(
            parse_options("30,0,0"),
            Err(ConfigError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            parse_options("0,5,0"),
            Err(ConfigError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            parse_options("30,5,0,warn=30"),
            Err(ConfigError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            parse_options("30,5,0,warn=10,touch="),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }
}
