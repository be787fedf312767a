//! launchpad - configuration resolution engine for native app launchers
//!
//! Given layered config files and the arguments a user typed, this crate
//! finds a suitable JVM or Python installation, splits the arguments
//! between runtime and application, and reports the resulting invocation
//! as a small line protocol.

pub mod core;
pub mod discovery;
pub mod ops;
pub mod runtime;
pub mod util;

/// Test utilities and mocks for launchpad unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides an in-memory host and fixture builders.
#[cfg(test)]
pub mod test_support;

pub use core::{Config, Context};
pub use ops::{resolve, Decision, Resolution};
pub use runtime::{LaunchPlan, RuntimeBackend};
pub use util::{Host, LaunchError, LaunchResult, RealHost};
