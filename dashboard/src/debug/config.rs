//! Debug configuration from environment variables

use std::path::PathBuf;

use lib_utils::{get_env_bool, get_env_or};

const DEFAULT_LOG_LEVEL: &str = "dashboard=info,shared=info,warn";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Log directory (for rotation)
    pub log_dir: PathBuf,
    /// Log file name prefix inside `log_dir`
    pub log_file_name: String,
    /// Log level filter (e.g., "dashboard=debug,info")
    pub log_level: String,
    /// Mirror logs to stderr. Stdout belongs to the parent protocol.
    pub log_to_stderr: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file_name: "dashboard.log".to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_to_stderr: true,
        }
    }
}

impl DebugConfig {
    /// Load configuration from environment variables. Malformed values fall
    /// back to defaults so logging can always start.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_dir: PathBuf::from(get_env_or("DASHBOARD_LOG_DIR", "logs")),
            log_file_name: defaults.log_file_name,
            log_level: get_env_or("RUST_LOG", DEFAULT_LOG_LEVEL),
            log_to_stderr: get_env_bool("DASHBOARD_LOG_STDERR", defaults.log_to_stderr)
                .unwrap_or(defaults.log_to_stderr),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    /// Check if debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.log_level.contains("debug") || self.log_level.contains("trace")
    }
}
