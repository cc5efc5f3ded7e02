//! # Dashboard Configuration
//!
//! Loaded from environment variables (a `.env` file is read first by the
//! binary) and validated on startup to fail fast if misconfigured.
//!
//! | variable                          | default                         |
//! |-----------------------------------|---------------------------------|
//! | `GPS_API_BASE_URL`                | `https://api-d.gpsguard.eu/v1`  |
//! | `GPS_AUTH_SCHEME`                 | `Orion`                         |
//! | `GPS_REQUEST_TIMEOUT_MS`          | `12000`                         |
//! | `GPS_REFRESH_WAIT_MS`             | `10000`                         |
//! | `GPS_MAX_REFRESH_RETRIES`         | `2`                             |
//! | `DASHBOARD_HANDSHAKE_INTERVAL_MS` | `2000`                          |
//! | `DASHBOARD_LEGACY_REQUESTS`       | `true`                          |
//! | `DASHBOARD_MODE`                  | persisted mode, else `dev`      |
//! | `DASHBOARD_STORAGE_PATH`          | `<data dir>/gps-dashboard/storage.json` |
//! | `DASHBOARD_DEFAULT_DEV_TOKEN`     | unset                           |
//! | `DASHBOARD_DEV_TOKEN`             | unset (applied as user input)   |
//! | `DASHBOARD_GROUP_CODE`            | unset (applied as user input)   |
//! | `DASHBOARD_FRAME_GROUP_CODE`      | unset (no host element)         |
//! | `DASHBOARD_HISTORY_LIMIT`         | `3`                             |
//! | `DASHBOARD_LOAD_HISTORY`          | `false`                         |

use std::path::PathBuf;
use std::time::Duration;

use lib_utils::{get_env, get_env_bool, get_env_or, get_env_parse_or};
use thiserror::Error;

use crate::embed::ControllerOptions;
use crate::services::api::{
    ClientOptions, DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL, DEFAULT_HISTORY_LIMIT, DEFAULT_REFRESH_WAIT,
    DEFAULT_REQUEST_TIMEOUT, MAX_REFRESH_RETRIES,
};
use crate::session::AppMode;
use crate::storage::FileStorage;

const MIN_HANDSHAKE_INTERVAL: Duration = Duration::from_millis(100);
const MAX_REFRESH_RETRIES_LIMIT: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Env(#[from] lib_utils::envs::Error),

    #[error("Invalid DASHBOARD_MODE '{0}', expected 'dev' or 'production'")]
    InvalidMode(String),

    #[error("{0}")]
    Invalid(String),

    #[error("No platform data directory available; set DASHBOARD_STORAGE_PATH")]
    NoStorageDir,
}

#[derive(Clone)]
pub struct DashboardConfig {
    /// Upstream API root, without trailing slash.
    pub base_url: String,
    pub auth_scheme: String,
    pub request_timeout: Duration,
    pub refresh_wait: Duration,
    pub max_refresh_retries: u32,
    pub handshake_interval: Duration,
    pub legacy_requests: bool,
    /// Overrides the persisted mode when set.
    pub mode: Option<AppMode>,
    pub storage_path: Option<PathBuf>,
    /// Seeded on start; never counts as user-entered.
    pub default_dev_token: Option<String>,
    /// Applied through the controller as if the user typed it.
    pub dev_token: Option<String>,
    /// Applied through the controller as if the user picked it.
    pub group_code: Option<String>,
    /// Initial `data-group-code` of the host element; enables the observer.
    pub frame_group_code: Option<String>,
    pub history_limit: usize,
    pub load_history: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_wait: DEFAULT_REFRESH_WAIT,
            max_refresh_retries: MAX_REFRESH_RETRIES,
            handshake_interval: crate::embed::DEFAULT_HANDSHAKE_INTERVAL,
            legacy_requests: true,
            mode: None,
            storage_path: None,
            default_dev_token: None,
            dev_token: None,
            group_code: None,
            frame_group_code: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            load_history: false,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mode = match optional("DASHBOARD_MODE") {
            Some(raw) => Some(AppMode::parse(&raw).ok_or(ConfigError::InvalidMode(raw))?),
            None => None,
        };

        Ok(Self {
            base_url: get_env_or("GPS_API_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            auth_scheme: get_env_or("GPS_AUTH_SCHEME", DEFAULT_AUTH_SCHEME),
            request_timeout: millis("GPS_REQUEST_TIMEOUT_MS", defaults.request_timeout)?,
            refresh_wait: millis("GPS_REFRESH_WAIT_MS", defaults.refresh_wait)?,
            max_refresh_retries: get_env_parse_or("GPS_MAX_REFRESH_RETRIES", defaults.max_refresh_retries)?,
            handshake_interval: millis("DASHBOARD_HANDSHAKE_INTERVAL_MS", defaults.handshake_interval)?,
            legacy_requests: get_env_bool("DASHBOARD_LEGACY_REQUESTS", defaults.legacy_requests)?,
            mode,
            storage_path: optional("DASHBOARD_STORAGE_PATH").map(PathBuf::from),
            default_dev_token: optional("DASHBOARD_DEFAULT_DEV_TOKEN"),
            dev_token: optional("DASHBOARD_DEV_TOKEN"),
            group_code: optional("DASHBOARD_GROUP_CODE"),
            frame_group_code: optional("DASHBOARD_FRAME_GROUP_CODE"),
            history_limit: get_env_parse_or("DASHBOARD_HISTORY_LIMIT", defaults.history_limit)?,
            load_history: get_env_bool("DASHBOARD_LOAD_HISTORY", defaults.load_history)?,
        })
    }

    /// Validate values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "GPS_API_BASE_URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.auth_scheme.trim().is_empty() || self.auth_scheme.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid("GPS_AUTH_SCHEME must be a single word".to_string()));
        }
        if self.request_timeout.is_zero() || self.refresh_wait.is_zero() {
            return Err(ConfigError::Invalid(
                "GPS_REQUEST_TIMEOUT_MS and GPS_REFRESH_WAIT_MS must be greater than 0".to_string(),
            ));
        }
        if self.max_refresh_retries > MAX_REFRESH_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "GPS_MAX_REFRESH_RETRIES must be at most {MAX_REFRESH_RETRIES_LIMIT}"
            )));
        }
        if self.handshake_interval < MIN_HANDSHAKE_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "DASHBOARD_HANDSHAKE_INTERVAL_MS must be at least {}",
                MIN_HANDSHAKE_INTERVAL.as_millis()
            )));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("DASHBOARD_HISTORY_LIMIT must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Explicit path, else the platform default.
    pub fn resolve_storage_path(&self) -> Result<PathBuf, ConfigError> {
        self.storage_path
            .clone()
            .or_else(FileStorage::default_path)
            .ok_or(ConfigError::NoStorageDir)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            auth_scheme: self.auth_scheme.clone(),
            refresh_wait: self.refresh_wait,
            max_refresh_retries: self.max_refresh_retries,
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            handshake_interval: self.handshake_interval,
            legacy_requests: self.legacy_requests,
            initial_mode: self.mode,
            default_dev_token: self.default_dev_token.clone(),
        }
    }
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("base_url", &self.base_url)
            .field("auth_scheme", &self.auth_scheme)
            .field("request_timeout", &self.request_timeout)
            .field("refresh_wait", &self.refresh_wait)
            .field("max_refresh_retries", &self.max_refresh_retries)
            .field("handshake_interval", &self.handshake_interval)
            .field("legacy_requests", &self.legacy_requests)
            .field("mode", &self.mode)
            .field("storage_path", &self.storage_path)
            .field("default_dev_token", &self.default_dev_token.as_ref().map(|_| "<set>"))
            .field("dev_token", &self.dev_token.as_ref().map(|_| "<set>"))
            .field("group_code", &self.group_code)
            .field("frame_group_code", &self.frame_group_code)
            .field("history_limit", &self.history_limit)
            .field("load_history", &self.load_history)
            .finish()
    }
}

fn optional(name: &'static str) -> Option<String> {
    get_env(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn millis(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let ms = get_env_parse_or(name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(ms))
}
