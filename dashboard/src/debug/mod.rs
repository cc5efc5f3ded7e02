//! # Logging
//!
//! Structured logging for the dashboard.
//!
//! - **File**: `logs/dashboard.log.<date>`, rotated daily, non-blocking writes
//! - **Stderr**: compact human-readable lines; stdout carries parent messages
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `dashboard=debug,info`)
//! - `DASHBOARD_LOG_DIR`: Log directory (default: `logs`)
//! - `DASHBOARD_LOG_STDERR`: Mirror logs to stderr (default: on)
//!
//! Tokens are never written to logs; only their presence is.

pub mod config;
pub mod logger;

pub use config::DebugConfig;
pub use tracing_appender::non_blocking::WorkerGuard;

/// Initialize logging from the environment.
///
/// ```rust,no_run
/// let _guard = dashboard::debug::init();
/// ```
pub fn init() -> Option<WorkerGuard> {
    logger::init(&DebugConfig::from_env())
}
