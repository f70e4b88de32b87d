//! Reclamation debt accounting.
//!
//! Time spent reclaiming adds to a debt; time spent running the program
//! pays it back at `idle_weight` times the rate. With the default weight of
//! 5 the bucket stays level at a 1/6 reclamation duty cycle, and any
//! sustained ratio above that grows the debt without bound until it crosses
//! the trigger threshold.

use gcquake_config::WatchdogConfig;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Token bucket of reclamation debt.
///
/// All arithmetic saturates: the debt never goes below zero and never
/// wraps.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    debt: Duration,
    idle_weight: u32,
    last_event_start: Instant,
    last_event_end: Instant,
    episodes: u64,
    total_busy: Duration,
    peak_debt: Duration,
}

impl TokenBucket {
    /// Create an empty bucket. Time before the first episode counts as idle
    /// from `origin`.
    #[must_use]
    pub fn new(idle_weight: u32, origin: Instant) -> Self {
        Self {
            debt: Duration::ZERO,
            idle_weight: idle_weight.max(1),
            last_event_start: origin,
            last_event_end: origin,
            episodes: 0,
            total_busy: Duration::ZERO,
            peak_debt: Duration::ZERO,
        }
    }

    /// Pay back `idle * idle_weight` of debt, clamping at zero.
    pub fn drain(&mut self, idle: Duration) -> Duration {
        let credit = idle.checked_mul(self.idle_weight).unwrap_or(Duration::MAX);
        self.debt = self.debt.saturating_sub(credit);
        self.debt
    }

    /// Add `busy` to the debt.
    pub fn accumulate(&mut self, busy: Duration) -> Duration {
        self.debt = self.debt.saturating_add(busy);
        self.total_busy = self.total_busy.saturating_add(busy);
        self.peak_debt = self.peak_debt.max(self.debt);
        self.debt
    }

    /// Record the start of a reclamation episode at `now`.
    ///
    /// Returns the debt after draining the idle time since the last episode
    /// ended.
    pub fn on_event_start(&mut self, now: Instant) -> Duration {
        let idle = now.saturating_duration_since(self.last_event_end);
        self.last_event_start = now;
        self.drain(idle)
    }

    /// Record the end of a reclamation episode at `now`.
    ///
    /// Returns the debt after adding the episode's duration.
    pub fn on_event_finish(&mut self, now: Instant) -> Duration {
        let busy = now.saturating_duration_since(self.last_event_start);
        self.last_event_end = now;
        self.episodes = self.episodes.saturating_add(1);
        self.accumulate(busy)
    }

    /// Current debt.
    #[must_use]
    pub fn debt(&self) -> Duration {
        self.debt
    }

    /// Idle weight in effect.
    #[must_use]
    pub fn idle_weight(&self) -> u32 {
        self.idle_weight
    }

    /// Number of finished episodes.
    #[must_use]
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Total time spent reclaiming.
    #[must_use]
    pub fn total_busy(&self) -> Duration {
        self.total_busy
    }

    /// Highest debt observed.
    #[must_use]
    pub fn peak_debt(&self) -> Duration {
        self.peak_debt
    }
}

/// How a debt compares to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DebtLevel {
    /// At or below every threshold.
    Nominal,
    /// Above the warning threshold, at or below the trigger threshold.
    Warning,
    /// Above the trigger threshold.
    Critical,
}

/// Trigger and warning thresholds. Crossing means strictly greater than.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    trigger: Duration,
    warning: Option<Duration>,
}

impl Thresholds {
    /// Create thresholds.
    #[must_use]
    pub fn new(trigger: Duration, warning: Option<Duration>) -> Self {
        Self { trigger, warning }
    }

    /// Thresholds configured for a watchdog.
    #[must_use]
    pub fn from_config(config: &WatchdogConfig) -> Self {
        Self::new(config.trigger_threshold, config.warning_threshold)
    }

    /// Trigger threshold.
    #[must_use]
    pub fn trigger(&self) -> Duration {
        self.trigger
    }

    /// Warning threshold, if enabled.
    #[must_use]
    pub fn warning(&self) -> Option<Duration> {
        self.warning
    }

    /// Classify a debt.
    #[must_use]
    pub fn classify(&self, debt: Duration) -> DebtLevel {
        if debt > self.trigger {
            DebtLevel::Critical
        } else if self.warning.is_some_and(|warning| debt > warning) {
            DebtLevel::Warning
        } else {
            DebtLevel::Nominal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn bucket(weight: u32) -> (TokenBucket, Instant) {
        let origin = Instant::now();
        (TokenBucket::new(weight, origin), origin)
    }

    #[test]
    fn test_busy_time_accumulates() {
        let (mut bucket, origin) = bucket(5);
        bucket.on_event_start(origin);
        let debt = bucket.on_event_finish(origin + 6 * SECOND);
        assert_eq!(debt, 6 * SECOND);
        assert_eq!(bucket.episodes(), 1);
        assert_eq!(bucket.total_busy(), 6 * SECOND);
    }

    #[test]
    fn test_idle_time_drains_at_weight() {
        let (mut bucket, origin) = bucket(5);
        bucket.on_event_start(origin);
        bucket.on_event_finish(origin + 10 * SECOND);
        // 1s idle pays back 5s
        let debt = bucket.on_event_start(origin + 11 * SECOND);
        assert_eq!(debt, 5 * SECOND);
    }

    #[test]
    fn test_debt_clamps_at_zero() {
        let (mut bucket, origin) = bucket(5);
        bucket.on_event_start(origin);
        bucket.on_event_finish(origin + SECOND);
        let debt = bucket.on_event_start(origin + 100 * SECOND);
        assert_eq!(debt, Duration::ZERO);
        assert_eq!(bucket.peak_debt(), SECOND);
    }

    #[test]
    fn test_clock_regression_counts_as_zero() {
        let (mut bucket, origin) = bucket(5);
        bucket.on_event_start(origin + 10 * SECOND);
        let debt = bucket.on_event_finish(origin);
        assert_eq!(debt, Duration::ZERO);
    }

    #[test]
    fn test_drain_saturates_on_huge_idle() {
        let (mut bucket, _) = bucket(u32::MAX);
        bucket.accumulate(Duration::from_secs(60));
        assert_eq!(bucket.drain(Duration::MAX), Duration::ZERO);
    }

    #[test]
    fn test_accumulate_saturates() {
        let (mut bucket, _) = bucket(1);
        bucket.accumulate(Duration::MAX);
        assert_eq!(bucket.accumulate(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn test_zero_weight_is_clamped() {
        let (bucket, _) = bucket(0);
        assert_eq!(bucket.idle_weight(), 1);
    }

    #[test]
    fn test_classify_is_strict() {
        let thresholds = Thresholds::new(30 * SECOND, Some(20 * SECOND));
        assert_eq!(thresholds.classify(20 * SECOND), DebtLevel::Nominal);
        assert_eq!(
            thresholds.classify(20 * SECOND + Duration::from_nanos(1)),
            DebtLevel::Warning
        );
        assert_eq!(thresholds.classify(30 * SECOND), DebtLevel::Warning);
        assert_eq!(thresholds.classify(31 * SECOND), DebtLevel::Critical);
    }

    #[test]
    fn test_classify_without_warning() {
        let thresholds = Thresholds::new(30 * SECOND, None);
        assert_eq!(thresholds.classify(25 * SECOND), DebtLevel::Nominal);
        assert_eq!(thresholds.classify(31 * SECOND), DebtLevel::Critical);
    }
}
