//! Child-process harness for tests that terminate the process.
//!
//! A termination test calls [`is_child`] first. In the parent it re-runs
//! itself with [`run_child_test`] and inspects how the child ended; in the
//! child it performs the fatal operation.

use std::io;
use std::process::{Command, ExitStatus};

/// Environment variable marking the child run.
pub const CHILD_ENV_VAR: &str = "GCQUAKE_TERMINATION_CHILD";

/// Whether this process is the child run of a termination test.
#[must_use]
pub fn is_child() -> bool {
    std::env::var_os(CHILD_ENV_VAR).is_some()
}

/// Re-run the current test binary, executing only `test_name`.
///
/// # Errors
///
/// Returns an error if the test binary cannot be located or spawned.
pub fn run_child_test(test_name: &str) -> io::Result<ExitStatus> {
    Command::new(std::env::current_exe()?)
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV_VAR, "1")
        .status()
}

/// The signal that terminated the child, if any.
#[cfg(unix)]
#[must_use]
pub fn terminating_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}
