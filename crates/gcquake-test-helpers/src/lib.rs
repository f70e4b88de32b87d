//! Shared test utilities for gcquake.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]`
//! - [`script`] - Scripted reclamation timelines against a manual clock
//! - [`sink`] - Counting warning sink
//! - [`child`] - Re-running a test in a child process to observe termination
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! gcquake-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use gcquake_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod child;
pub mod must;
pub mod prelude;
pub mod script;
pub mod sink;

pub use must::*;
