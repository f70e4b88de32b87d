//! Diagnostic logging bootstrap.
//!
//! The watchdog logs through `tracing`. Hosts that do not install their
//! own subscriber can call [`init_stderr_logging`] once at startup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV_VAR: &str = "GCQUAKE_LOG";

/// Install a stderr subscriber filtered by `GCQUAKE_LOG`, or by
/// `default_directive` when the variable is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_stderr_logging(default_directive: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_names(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
