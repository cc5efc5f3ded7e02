//! # Session
//!
//! The single source of truth for the active bearer token and operating mode.
//!
//! Both values live in `tokio::sync::watch` channels, so any component can
//! read the current value cheaply or await the next change. The API client
//! depends on this handle instead of on ambient global state.
//!
//! ```rust
//! use dashboard::session::{AppMode, Session};
//!
//! let session = Session::new(AppMode::Dev);
//! assert!(session.set_token("abc123"));
//! assert!(!session.set_token("abc123"));
//! assert_eq!(session.token(), "abc123");
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::core::error::RefreshError;

/// Operating mode of the dashboard.
///
/// - `Dev`: standalone, the user types a token
/// - `Production`: embedded, credentials come from the parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    #[default]
    Dev,
    Production,
}

impl AppMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Dev => "dev",
            AppMode::Production => "production",
        }
    }

    /// Parse the persisted representation. Case-insensitive, `prod` accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" => Some(AppMode::Dev),
            "production" | "prod" => Some(AppMode::Production),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AppMode::Dev => AppMode::Production,
            AppMode::Production => AppMode::Dev,
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared token and mode holder.
pub struct Session {
    token: watch::Sender<String>,
    mode: watch::Sender<AppMode>,
}

impl Session {
    pub fn new(mode: AppMode) -> Self {
        let (token, _) = watch::channel(String::new());
        let (mode, _) = watch::channel(mode);
        Self { token, mode }
    }

    /// Current token; empty when none is held.
    pub fn token(&self) -> String {
        self.token.borrow().clone()
    }

    pub fn has_token(&self) -> bool {
        !self.token.borrow().is_empty()
    }

    /// Replace the token. Returns `true` when the stored value changed;
    /// writing the same value does not wake waiters.
    pub fn set_token(&self, token: impl Into<String>) -> bool {
        let token = token.into();
        self.token.send_if_modified(|current| {
            if *current == token {
                false
            } else {
                *current = token;
                true
            }
        })
    }

    pub fn clear_token(&self) -> bool {
        self.set_token(String::new())
    }

    pub fn subscribe_token(&self) -> watch::Receiver<String> {
        self.token.subscribe()
    }

    pub fn mode(&self) -> AppMode {
        *self.mode.borrow()
    }

    /// Returns `true` when the mode changed.
    pub fn set_mode(&self, mode: AppMode) -> bool {
        self.mode.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        })
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<AppMode> {
        self.mode.subscribe()
    }

    /// Wait until the token is non-empty and differs from `previous`.
    ///
    /// The current value is checked first, so a token that arrived before
    /// the wait started is picked up without another notification.
    pub async fn wait_for_new_token(
        &self,
        previous: &str,
        limit: Duration,
    ) -> Result<String, RefreshError> {
        let mut rx = self.token.subscribe();
        let wait = async {
            loop {
                {
                    let current = rx.borrow_and_update();
                    if !current.is_empty() && *current != previous {
                        return Ok(current.clone());
                    }
                }
                if rx.changed().await.is_err() {
                    return Err(RefreshError::SessionClosed);
                }
            }
        };

        match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::Timeout(limit)),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AppMode::default())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("has_token", &self.has_token())
            .field("mode", &self.mode())
            .finish()
    }
}
