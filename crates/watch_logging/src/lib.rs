#![deny(missing_docs)]
//! Shared logging utilities for the indexwatch workspace.
//!
//! Every crate logs through the `watch_*` macros so that all records carry
//! the single `indexwatch` target. A minimal initializer for test runs is
//! provided as well.

#[doc(hidden)]
pub use log;

/// Log target used by all `watch_*` macros.
pub const TARGET: &str = "indexwatch";

/// Logs a trace-level message under the indexwatch target.
#[macro_export]
macro_rules! watch_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the indexwatch target.
#[macro_export]
macro_rules! watch_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the indexwatch target.
#[macro_export]
macro_rules! watch_info {
    ($($arg:tt)*) => {{
        $crate::log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the indexwatch target.
#[macro_export]
macro_rules! watch_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the indexwatch target.
#[macro_export]
macro_rules! watch_error {
    ($($arg:tt)*) => {{
        $crate::log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a terminal logger for tests.
///
/// Safe to call from many tests: if a logger is already installed the call
/// is a no-op.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Never,
    )]);
}
