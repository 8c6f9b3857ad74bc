#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Messages logged while
//! a harvest run is active are prefixed with `[label#iteration]` so interleaved
//! output from the `following` and `followers` runs stays readable.

use std::cell::Cell;

thread_local! {
    /// Label of the harvest run active on this thread, if any.
    static HARVEST_LABEL: Cell<Option<&'static str>> = const { Cell::new(None) };
    /// Scroll iteration of the active harvest run.
    static SCROLL_ITERATION: Cell<u64> = const { Cell::new(0) };
}

/// Marks the start of a harvest run on the current thread.
///
/// Resets the iteration counter to 0.
pub fn set_harvest_context(label: &'static str) {
    HARVEST_LABEL.with(|v| v.set(Some(label)));
    SCROLL_ITERATION.with(|v| v.set(0));
}

/// Sets the scroll iteration for the current thread.
/// The harvest loop calls this once per iteration.
pub fn set_scroll_iteration(iteration: u64) {
    SCROLL_ITERATION.with(|v| v.set(iteration));
}

/// Retrieves the scroll iteration for the current thread.
/// Returns 0 if no iteration has been recorded.
pub fn scroll_iteration() -> u64 {
    SCROLL_ITERATION.with(|v| v.get())
}

/// Clears the harvest context once a run ends.
pub fn clear_harvest_context() {
    HARVEST_LABEL.with(|v| v.set(None));
    SCROLL_ITERATION.with(|v| v.set(0));
}

/// Returns the `[label#iteration] ` prefix for the active run, or an empty
/// string outside a run. Used by the logging macros.
#[doc(hidden)]
pub fn context_prefix() -> String {
    match HARVEST_LABEL.with(|v| v.get()) {
        Some(label) => format!("[{label}#{}] ", scroll_iteration()),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_tracks_label_and_iteration() {
        assert_eq!(context_prefix(), "");
        set_harvest_context("following");
        set_scroll_iteration(7);
        assert_eq!(context_prefix(), "[following#7] ");
        clear_harvest_context();
        assert_eq!(context_prefix(), "");
        assert_eq!(scroll_iteration(), 0);
    }
}
