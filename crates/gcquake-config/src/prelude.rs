//! Prelude for gcquake-config.
//!
//! This module re-exports the most commonly used types for convenient importing.

pub use crate::action::ActionKind;
pub use crate::config::{WatchdogConfig, WatchdogConfigBuilder};
pub use crate::error::{ConfigError, ConfigResult};
