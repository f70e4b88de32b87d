//! # gcquake-watchdog
//!
//! A watchdog that ends a process spending too much of its time in memory
//! reclamation (garbage collection) before it wedges.
//!
//! The host reports each reclamation episode. Time spent reclaiming adds to
//! a debt; time spent running pays it back at `idle_weight` times the rate.
//! When the debt exceeds the trigger threshold the configured
//! [`ActionKind`](gcquake_config::ActionKind) runs on a dedicated worker
//! thread, always ending in an unblockable kill.
//!
//! ## Components
//!
//! - [`TokenBucket`](bucket::TokenBucket): debt accounting
//! - [`TriggerGate`](gate::TriggerGate): one-shot `Idle → Armed → Fired` trigger
//! - [`ActionExecutor`](action::ActionExecutor): termination plans over a
//!   [`ProcessControl`](process::ProcessControl)
//! - [`WarningSink`](warning::WarningSink): early-warning notifications
//! - [`EventMonitor`](monitor::EventMonitor): the façade the host drives
//!
//! ## Example
//!
//! ```rust
//! use gcquake_watchdog::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let clock = Arc::new(ManualClock::new());
//! let process = Arc::new(RecordingProcess::new());
//! let config = WatchdogConfig::parse("30,5,KILL").expect("valid options");
//! let monitor = EventMonitor::builder(config)
//!     .clock(clock.clone())
//!     .process(process.clone())
//!     .build()
//!     .expect("valid config");
//!
//! for _ in 0..6 {
//!     monitor.on_reclamation_start();
//!     clock.advance(Duration::from_secs(6));
//!     monitor.on_reclamation_finish();
//! }
//!
//! assert_eq!(monitor.trigger_state(), TriggerState::Fired);
//! assert_eq!(process.steps(), vec![ProcessStep::Kill]);
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
pub mod bucket;
pub mod clock;
pub mod error;
pub mod gate;
pub mod monitor;
pub mod prelude;
pub mod process;
pub mod telemetry;
pub mod warning;

pub use action::ActionExecutor;
pub use bucket::{DebtLevel, Thresholds, TokenBucket};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{WatchdogError, WatchdogResult};
pub use gate::{ArmOutcome, TriggerGate, TriggerState};
pub use monitor::{EventMonitor, EventMonitorBuilder, MonitorStats, Verdict};
pub use process::{CurrentProcess, ProcessControl, ProcessStep, RecordingProcess};
pub use warning::{SentinelFile, WarningEvent, WarningSink};
