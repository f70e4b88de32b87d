//! Prelude for gcquake-watchdog.
//!
//! Re-exports the watchdog types together with the configuration types
//! needed to build a monitor.

pub use crate::action::ActionExecutor;
pub use crate::bucket::{DebtLevel, Thresholds, TokenBucket};
pub use crate::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::error::{WatchdogError, WatchdogResult};
pub use crate::gate::{ArmOutcome, TriggerGate, TriggerState};
pub use crate::monitor::{EventMonitor, EventMonitorBuilder, MonitorStats, Verdict};
pub use crate::process::{CurrentProcess, ProcessControl, ProcessStep, RecordingProcess};
pub use crate::warning::{SentinelFile, WarningEvent, WarningSink};
pub use gcquake_config::{ActionKind, ConfigError, WatchdogConfig};
