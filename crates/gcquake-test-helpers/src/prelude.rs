//! Convenience re-exports for common test utilities.

pub use crate::child::{is_child, run_child_test};
pub use crate::must::{must, must_parse, must_some, must_with};
pub use crate::script::{Episode, EpisodeScript, triggered};
pub use crate::sink::CountingSink;

#[cfg(unix)]
pub use crate::child::terminating_signal;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
