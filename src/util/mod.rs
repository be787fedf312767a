//! Shared utilities

pub mod errors;
pub mod host;
pub mod logging;
pub mod platform;
pub mod process;

pub use errors::{LaunchError, LaunchResult};
pub use host::{Host, RealHost};
pub use platform::Platform;
