//! # gcquake-config
//!
//! Configuration for the gcquake reclamation-overhead watchdog.
//!
//! The host passes the watchdog a single option string at startup:
//!
//! ```text
//! <threshold_secs>,<idle_weight>,<action>[,warn=<secs>][,touch=<path>]
//! ```
//!
//! | Field           | Default | Meaning                                      |
//! |-----------------|---------|----------------------------------------------|
//! | `threshold_secs`| `30`    | debt above which the action fires            |
//! | `idle_weight`   | `5`     | idle time is credited at this multiple       |
//! | `action`        | `0`     | `0`/`OOM`, a signal number, `ABORT`, `KILL`  |
//! | `warn`          | off     | debt above which the warning sink is touched |
//! | `touch`         | `/tmp/gcquake_warn_gc` | sentinel path for warnings    |
//!
//! ## Example
//!
//! ```rust
//! use gcquake_config::prelude::*;
//! use std::time::Duration;
//!
//! let config = WatchdogConfig::parse("60,9,KILL,warn=45").expect("valid options");
//! assert_eq!(config.trigger_threshold, Duration::from_secs(60));
//! assert_eq!(config.action, ActionKind::ImmediateTerminate);
//!
//! // Malformed options never stop the host; defaults are used instead.
//! let config = WatchdogConfig::from_options(Some("sixty,nine"));
//! assert_eq!(config, WatchdogConfig::default());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod action;
pub mod config;
pub mod error;
mod options;
pub mod prelude;

pub use action::ActionKind;
pub use config::{
    DEFAULT_IDLE_WEIGHT, DEFAULT_TRIGGER_THRESHOLD_SECS, DEFAULT_WARNING_SINK, WatchdogConfig,
    WatchdogConfigBuilder,
};
pub use error::{ConfigError, ConfigResult};
