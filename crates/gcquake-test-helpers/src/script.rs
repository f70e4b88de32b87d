//! Scripted reclamation timelines.
//!
//! An [`EpisodeScript`] is a list of idle and reclamation spans replayed
//! against an [`EventMonitor`] driven by a [`ManualClock`].
//!
//! ```rust
//! use gcquake_test_helpers::script::EpisodeScript;
//! use std::time::Duration;
//!
//! // Six back-to-back 6s reclamations.
//! let script = EpisodeScript::new().repeat(6, Duration::ZERO, Duration::from_secs(6));
//! assert_eq!(script.len(), 6);
//! ```

use gcquake_watchdog::clock::ManualClock;
use gcquake_watchdog::monitor::{EventMonitor, Verdict};
use std::time::Duration;

/// One reclamation episode preceded by an idle span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Episode {
    /// Time running before the episode starts.
    pub idle: Duration,
    /// Time spent reclaiming.
    pub busy: Duration,
}

/// A replayable sequence of episodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeScript {
    episodes: Vec<Episode>,
}

impl EpisodeScript {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one episode.
    #[must_use]
    pub fn episode(mut self, idle: Duration, busy: Duration) -> Self {
        self.episodes.push(Episode { idle, busy });
        self
    }

    /// Append `count` identical episodes.
    #[must_use]
    pub fn repeat(mut self, count: usize, idle: Duration, busy: Duration) -> Self {
        self.episodes
            .extend(std::iter::repeat_n(Episode { idle, busy }, count));
        self
    }

    /// Number of episodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Whether the script has no episodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Replay every episode, returning each finish verdict.
    pub fn run(&self, monitor: &EventMonitor, clock: &ManualClock) -> Vec<Verdict> {
        self.episodes
            .iter()
            .map(|episode| {
                clock.advance(episode.idle);
                monitor.on_reclamation_start();
                clock.advance(episode.busy);
                monitor.on_reclamation_finish()
            })
            .collect()
    }
}

/// Whether any verdict is a trigger.
#[must_use]
pub fn triggered(verdicts: &[Verdict]) -> bool {
    verdicts
        .iter()
        .any(|verdict| matches!(verdict, Verdict::Triggered(_)))
}
