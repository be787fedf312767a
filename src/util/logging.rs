//! Diagnostic logging setup.
//!
//! Standard output carries the launch protocol, so every log line goes to
//! stderr. Warnings are always shown; `LAUNCHPAD_DEBUG` enables the debug
//! trace and `LAUNCHPAD_LOG` overrides the filter entirely.

use tracing_subscriber::EnvFilter;

/// Environment variable that turns on the debug trace.
pub const DEBUG_ENV: &str = "LAUNCHPAD_DEBUG";

/// Environment variable holding an explicit filter directive.
pub const LOG_ENV: &str = "LAUNCHPAD_LOG";

/// Whether a `LAUNCHPAD_DEBUG` value enables debugging.
pub fn debug_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
    }
}

/// Build the filter from the two environment toggles.
pub fn filter_directive(debug: Option<&str>, explicit: Option<&str>) -> String {
    if let Some(explicit) = explicit.filter(|s| !s.trim().is_empty()) {
        return explicit.to_string();
    }
    if debug_enabled(debug) {
        "launchpad=debug".to_string()
    } else {
        "launchpad=warn".to_string()
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let debug = std::env::var(DEBUG_ENV).ok();
    let explicit = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(debug.as_deref(), explicit.as_deref());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
