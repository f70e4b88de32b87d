//! The watchdog façade driven by host reclamation callbacks.
//!
//! ```text
//! runtime threads                         worker "gcquake-action"
//! ───────────────                         ───────────────────────
//! on_reclamation_start ──► TokenBucket
//! on_reclamation_finish ─► TokenBucket ──► TriggerGate::arm ──► await_trigger
//!                              │                                    │
//!                              └──► WarningSink                     ▼
//! on_resource_exhausted ───────────────────────────────────► ActionExecutor
//! ```
//!
//! Debt and trigger state change together under one ledger lock; the gate's
//! own lock is only ever taken while holding it, never the other way round.

use gcquake_config::{ActionKind, WatchdogConfig};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::action::ActionExecutor;
use crate::bucket::{DebtLevel, Thresholds, TokenBucket};
use crate::clock::{Clock, MonotonicClock};
use crate::error::{WatchdogError, WatchdogResult};
use crate::gate::{ArmOutcome, TriggerGate, TriggerState};
use crate::process::{CurrentProcess, ProcessControl};
use crate::warning::{SentinelFile, WarningEvent, WarningSink};

/// Name of the dedicated action worker thread.
pub const WORKER_THREAD_NAME: &str = "gcquake-action";

/// What a finished reclamation episode led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    /// Debt at or below every threshold.
    Within,
    /// Debt crossed the warning threshold; the sink was notified.
    WarningRaised,
    /// Debt is still above the warning threshold from an earlier crossing.
    WarningHeld,
    /// Debt is above the trigger threshold.
    Triggered(ArmOutcome),
}

/// Point-in-time snapshot of monitor activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Finished reclamation episodes.
    pub episodes: u64,
    /// Total time spent reclaiming.
    pub total_reclamation: Duration,
    /// Highest debt observed.
    pub peak_debt: Duration,
    /// Debt now.
    pub current_debt: Duration,
    /// Warning sink notifications.
    pub warnings_raised: u64,
    /// Resource-exhaustion notifications.
    pub exhaustion_events: u64,
    /// Trigger state.
    pub trigger_state: TriggerState,
    /// Whether the action worker is alive.
    pub worker_running: bool,
}

#[derive(Debug)]
struct Ledger {
    bucket: TokenBucket,
    warning_latched: bool,
    warnings_raised: u64,
    exhaustion_events: u64,
}

/// Reclamation watchdog for one process.
///
/// The host calls [`on_process_init`](Self::on_process_init) once, then
/// [`on_reclamation_start`](Self::on_reclamation_start) and
/// [`on_reclamation_finish`](Self::on_reclamation_finish) around every
/// reclamation episode, and
/// [`on_resource_exhausted`](Self::on_resource_exhausted) when it runs out of
/// a resource. All methods take `&self` and may be called from any thread.
pub struct EventMonitor {
    config: WatchdogConfig,
    thresholds: Thresholds,
    clock: Arc<dyn Clock>,
    ledger: Mutex<Ledger>,
    gate: Arc<TriggerGate>,
    executor: Arc<ActionExecutor>,
    warning_sink: Option<Arc<dyn WarningSink>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_started: AtomicBool,
}

impl std::fmt::Debug for EventMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMonitor")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("ledger", &self.ledger)
            .field("gate", &self.gate)
            .field("executor", &self.executor)
            .field("warning_sink", &self.warning_sink.is_some())
            .field("worker_started", &self.worker_started)
            .finish_non_exhaustive()
    }
}

impl EventMonitor {
    /// Create a monitor acting on the running process.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Config`] if `config` does not validate.
    pub fn new(config: WatchdogConfig) -> WatchdogResult<Self> {
        Self::builder(config).build()
    }

    /// Create a monitor from the host's raw option string.
    ///
    /// Malformed options fall back to the defaults; the resolved
    /// configuration is logged.
    #[must_use]
    pub fn from_options(options: Option<&str>) -> Self {
        let config = WatchdogConfig::from_options(options);
        tracing::info!(options = %config, "Reclamation watchdog configured");
        Self::builder(config).assemble()
    }

    /// Start building a monitor.
    #[must_use]
    pub fn builder(config: WatchdogConfig) -> EventMonitorBuilder {
        EventMonitorBuilder::new(config)
    }

    /// The monitor's configuration.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Record the start of a reclamation episode now.
    pub fn on_reclamation_start(&self) -> Duration {
        self.on_reclamation_start_at(self.clock.now())
    }

    /// Record the start of a reclamation episode at `now`.
    ///
    /// Returns the debt after idle time has been credited.
    pub fn on_reclamation_start_at(&self, now: Instant) -> Duration {
        let mut ledger = self.ledger.lock();
        let debt = ledger.bucket.on_event_start(now);
        if self.thresholds.warning().is_some_and(|warning| debt <= warning) {
            ledger.warning_latched = false;
        }
        tracing::trace!(?debt, "Reclamation started");
        debt
    }

    /// Record the end of a reclamation episode now.
    pub fn on_reclamation_finish(&self) -> Verdict {
        self.on_reclamation_finish_at(self.clock.now())
    }

    /// Record the end of a reclamation episode at `now`.
    pub fn on_reclamation_finish_at(&self, now: Instant) -> Verdict {
        let mut ledger = self.ledger.lock();
        let debt = ledger.bucket.on_event_finish(now);
        tracing::debug!(?debt, episodes = ledger.bucket.episodes(), "Reclamation finished");

        let verdict = match self.thresholds.classify(debt) {
            DebtLevel::Critical => {
                let outcome = self.gate.arm();
                if outcome == ArmOutcome::Armed {
                    tracing::error!(
                        ?debt,
                        threshold = ?self.thresholds.trigger(),
                        action = %self.config.action,
                        "Reclamation debt exceeded threshold, triggering corrective action"
                    );
                }
                Verdict::Triggered(outcome)
            }
            DebtLevel::Warning if ledger.warning_latched => Verdict::WarningHeld,
            DebtLevel::Warning => {
                ledger.warning_latched = true;
                ledger.warnings_raised = ledger.warnings_raised.saturating_add(1);
                Verdict::WarningRaised
            }
            DebtLevel::Nominal => {
                ledger.warning_latched = false;
                Verdict::Within
            }
        };
        drop(ledger);

        match verdict {
            Verdict::WarningRaised => self.raise_warning(debt),
            Verdict::Triggered(ArmOutcome::Armed | ArmOutcome::AlreadyArmed) => {
                self.fire_without_worker();
            }
            _ => {}
        }
        verdict
    }

    /// Handle a resource-exhaustion notification from the host.
    ///
    /// Runs the exhaustion plan on the calling thread, whatever the debt or
    /// trigger state.
    pub fn on_resource_exhausted(&self, description: &str) {
        {
            let mut ledger = self.ledger.lock();
            ledger.exhaustion_events = ledger.exhaustion_events.saturating_add(1);
        }
        tracing::error!(
            description,
            action = %self.config.action,
            "Resource exhausted, executing corrective action"
        );
        self.executor.fire_exhausted(self.config.action);
    }

    /// Start the action worker at host initialisation.
    ///
    /// A second call keeps the first worker. Failing to start the worker
    /// would leave the watchdog unable to act, so it is fatal.
    pub fn on_process_init(&self) {
        match self.start_worker() {
            Ok(()) => {}
            Err(WatchdogError::WorkerAlreadyStarted) => {
                tracing::warn!("Process init reported twice, keeping the running worker");
            }
            Err(error) => self.executor.fatal(&error.to_string()),
        }
    }

    /// Start the dedicated action worker.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::WorkerAlreadyStarted`] if a worker was
    /// already started, or [`WatchdogError::WorkerSpawn`] if the thread
    /// could not be created.
    pub fn start_worker(&self) -> WatchdogResult<()> {
        let mut slot = self.worker.lock();
        if self.worker_started.load(Ordering::Acquire) {
            return Err(WatchdogError::WorkerAlreadyStarted);
        }

        let gate = Arc::clone(&self.gate);
        let executor = Arc::clone(&self.executor);
        let action = self.config.action;
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || {
                if gate.await_trigger() {
                    executor.fire(action);
                }
            })
            .map_err(WatchdogError::worker_spawn)?;

        *slot = Some(handle);
        self.worker_started.store(true, Ordering::Release);
        tracing::info!(%action, "Corrective action worker started");
        Ok(())
    }

    /// Wait for the action worker to exit.
    ///
    /// Returns `false` if no worker is running or it panicked. Blocks until
    /// the gate fires, so only call it once a trigger is expected.
    pub fn join_worker(&self) -> bool {
        let handle = self.worker.lock().take();
        handle.is_some_and(|handle| handle.join().is_ok())
    }

    /// Current debt.
    #[must_use]
    pub fn debt(&self) -> Duration {
        self.ledger.lock().bucket.debt()
    }

    /// Current trigger state.
    #[must_use]
    pub fn trigger_state(&self) -> TriggerState {
        self.gate.state()
    }

    /// Snapshot of monitor activity.
    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        let (episodes, total_reclamation, peak_debt, current_debt, warnings, exhaustions) = {
            let ledger = self.ledger.lock();
            (
                ledger.bucket.episodes(),
                ledger.bucket.total_busy(),
                ledger.bucket.peak_debt(),
                ledger.bucket.debt(),
                ledger.warnings_raised,
                ledger.exhaustion_events,
            )
        };
        let worker_running = self
            .worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());

        MonitorStats {
            episodes,
            total_reclamation,
            peak_debt,
            current_debt,
            warnings_raised: warnings,
            exhaustion_events: exhaustions,
            trigger_state: self.gate.state(),
            worker_running,
        }
    }

    fn raise_warning(&self, debt: Duration) {
        let (Some(sink), Some(threshold)) = (&self.warning_sink, self.thresholds.warning()) else {
            return;
        };
        sink.notify(&WarningEvent { debt, threshold });
    }

    /// Without a worker nobody waits on the gate, so the reporting thread
    /// claims it and acts inline.
    fn fire_without_worker(&self) {
        if self.worker_started.load(Ordering::Acquire) || !self.gate.try_fire() {
            return;
        }
        let action = if self.config.action.requires_worker() {
            tracing::warn!(
                configured = %self.config.action,
                "No action worker running, terminating immediately instead"
            );
            ActionKind::ImmediateTerminate
        } else {
            self.config.action
        };
        self.executor.fire(action);
    }
}

/// Builder for [`EventMonitor`].
pub struct EventMonitorBuilder {
    config: WatchdogConfig,
    clock: Arc<dyn Clock>,
    process: Arc<dyn ProcessControl>,
    warning_sink: Option<Arc<dyn WarningSink>>,
}

impl std::fmt::Debug for EventMonitorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMonitorBuilder")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("process", &self.process)
            .field("warning_sink", &self.warning_sink.is_some())
            .finish()
    }
}

impl EventMonitorBuilder {
    fn new(config: WatchdogConfig) -> Self {
        let warning_sink = config
            .warning_target()
            .map(|path| Arc::new(SentinelFile::new(path)) as Arc<dyn WarningSink>);
        Self {
            config,
            clock: Arc::new(MonotonicClock),
            process: Arc::new(CurrentProcess),
            warning_sink,
        }
    }

    /// Use `clock` for timestamps.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Act on `process` instead of the running process.
    #[must_use]
    pub fn process(mut self, process: Arc<dyn ProcessControl>) -> Self {
        self.process = process;
        self
    }

    /// Notify `sink` on warning crossings instead of the configured
    /// sentinel file.
    #[must_use]
    pub fn warning_sink(mut self, sink: Arc<dyn WarningSink>) -> Self {
        self.warning_sink = Some(sink);
        self
    }

    /// Build the monitor.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Config`] if the configuration does not
    /// validate.
    pub fn build(self) -> WatchdogResult<EventMonitor> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    fn assemble(self) -> EventMonitor {
        let origin = self.clock.now();
        EventMonitor {
            thresholds: Thresholds::from_config(&self.config),
            ledger: Mutex::new(Ledger {
                bucket: TokenBucket::new(self.config.idle_weight, origin),
                warning_latched: false,
                warnings_raised: 0,
                exhaustion_events: 0,
            }),
            gate: Arc::new(TriggerGate::new()),
            executor: Arc::new(ActionExecutor::new(self.process)),
            warning_sink: self.warning_sink,
            worker: Mutex::new(None),
            worker_started: AtomicBool::new(false),
            clock: self.clock,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::process::{ProcessStep, RecordingProcess};
    use std::sync::atomic::AtomicU32;

    const SECOND: Duration = Duration::from_secs(1);

    struct Harness {
        monitor: EventMonitor,
        clock: Arc<ManualClock>,
        process: Arc<RecordingProcess>,
    }

    fn harness(config: WatchdogConfig) -> WatchdogResult<Harness> {
        let clock = Arc::new(ManualClock::new());
        let process = Arc::new(RecordingProcess::new());
        let monitor = EventMonitor::builder(config)
            .clock(clock.clone())
            .process(process.clone())
            .warning_sink(Arc::new(|_: &WarningEvent| {}))
            .build()?;
        Ok(Harness {
            monitor,
            clock,
            process,
        })
    }

    impl Harness {
        fn episode(&self, idle: Duration, busy: Duration) -> Verdict {
            self.clock.advance(idle);
            self.monitor.on_reclamation_start();
            self.clock.advance(busy);
            self.monitor.on_reclamation_finish()
        }
    }

    #[test]
    fn test_short_episode_is_within() -> WatchdogResult<()> {
        let h = harness(WatchdogConfig::default())?;
        assert_eq!(h.episode(Duration::ZERO, 6 * SECOND), Verdict::Within);
        assert_eq!(h.monitor.debt(), 6 * SECOND);
        assert_eq!(h.monitor.trigger_state(), TriggerState::Idle);
        Ok(())
    }

    #[test]
    fn test_trigger_without_worker_fires_inline() -> WatchdogResult<()> {
        let config = WatchdogConfig::builder()
            .action(ActionKind::DeliverSignal(15))
            .build()?;
        let h = harness(config)?;
        let verdict = h.episode(Duration::ZERO, 31 * SECOND);
        assert_eq!(verdict, Verdict::Triggered(ArmOutcome::Armed));
        assert_eq!(h.monitor.trigger_state(), TriggerState::Fired);
        assert_eq!(
            h.process.steps(),
            vec![ProcessStep::Deliver(15), ProcessStep::Kill]
        );
        Ok(())
    }

    #[test]
    fn test_inline_fallback_substitutes_kill_for_exhaustion() -> WatchdogResult<()> {
        let h = harness(WatchdogConfig::default())?;
        h.episode(Duration::ZERO, 31 * SECOND);
        assert_eq!(h.process.steps(), vec![ProcessStep::Kill]);
        Ok(())
    }

    #[test]
    fn test_worker_runs_the_configured_action() -> WatchdogResult<()> {
        let h = harness(WatchdogConfig::default())?;
        h.monitor.start_worker()?;
        assert!(h.monitor.stats().worker_running);

        let verdict = h.episode(Duration::ZERO, 31 * SECOND);
        assert_eq!(verdict, Verdict::Triggered(ArmOutcome::Armed));
        assert!(h.monitor.join_worker());
        assert_eq!(
            h.process.steps(),
            vec![ProcessStep::ExhaustMemory, ProcessStep::Kill]
        );
        assert_eq!(h.monitor.trigger_state(), TriggerState::Fired);
        Ok(())
    }

    #[test]
    fn test_second_worker_is_rejected() -> WatchdogResult<()> {
        let h = harness(WatchdogConfig::default())?;
        h.monitor.start_worker()?;
        assert!(matches!(
            h.monitor.start_worker(),
            Err(WatchdogError::WorkerAlreadyStarted)
        ));
        // Logged, not fatal.
        h.monitor.on_process_init();
        assert!(h.process.steps().is_empty());

        h.episode(Duration::ZERO, 31 * SECOND);
        assert!(h.monitor.join_worker());
        Ok(())
    }

    #[test]
    fn test_resource_exhausted_ignores_debt() -> WatchdogResult<()> {
        let config = WatchdogConfig::builder()
            .action(ActionKind::AbortWithCoreDump)
            .build()?;
        let h = harness(config)?;
        h.monitor.on_resource_exhausted("Java heap space");
        assert_eq!(h.process.steps(), vec![ProcessStep::Abort, ProcessStep::Kill]);
        assert_eq!(h.monitor.stats().exhaustion_events, 1);
        assert_eq!(h.monitor.trigger_state(), TriggerState::Idle);
        Ok(())
    }

    #[test]
    fn test_warning_latch() -> WatchdogResult<()> {
        let config = WatchdogConfig::builder().warning_threshold_secs(20).build()?;
        let clock = Arc::new(ManualClock::new());
        let calls = Arc::new(AtomicU32::new(0));
        let sink_calls = Arc::clone(&calls);
        let monitor = EventMonitor::builder(config)
            .clock(clock.clone())
            .process(Arc::new(RecordingProcess::new()))
            .warning_sink(Arc::new(move |_: &WarningEvent| {
                sink_calls.fetch_add(1, Ordering::SeqCst);
            }))
            .build()?;

        monitor.on_reclamation_start();
        clock.advance(21 * SECOND);
        assert_eq!(monitor.on_reclamation_finish(), Verdict::WarningRaised);

        monitor.on_reclamation_start();
        clock.advance(SECOND);
        assert_eq!(monitor.on_reclamation_finish(), Verdict::WarningHeld);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // 1s idle at weight 5 drains to 17s, reopening the latch.
        clock.advance(SECOND);
        monitor.on_reclamation_start();
        clock.advance(4 * SECOND);
        assert_eq!(monitor.on_reclamation_finish(), Verdict::WarningRaised);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.stats().warnings_raised, 2);
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = WatchdogConfig {
            idle_weight: 0,
            ..WatchdogConfig::default()
        };
        assert!(matches!(
            EventMonitor::new(config),
            Err(WatchdogError::Config(_))
        ));
    }

    #[test]
    fn test_from_options_resolves_config() {
        let monitor = EventMonitor::from_options(Some("10,2,KILL"));
        assert_eq!(monitor.config().trigger_threshold, 10 * SECOND);
        assert_eq!(monitor.config().action, ActionKind::ImmediateTerminate);

        let monitor = EventMonitor::from_options(Some("ten"));
        assert_eq!(monitor.config(), &WatchdogConfig::default());
    }

    #[test]
    fn test_stats_snapshot() -> WatchdogResult<()> {
        let h = harness(WatchdogConfig::default())?;
        h.episode(Duration::ZERO, 4 * SECOND);
        h.episode(SECOND, 3 * SECOND);
        let stats = h.monitor.stats();
        assert_eq!(stats.episodes, 2);
        assert_eq!(stats.total_reclamation, 7 * SECOND);
        assert_eq!(stats.current_debt, 3 * SECOND);
        assert_eq!(stats.peak_debt, 4 * SECOND);
        assert!(!stats.worker_running);
        Ok(())
    }
}
