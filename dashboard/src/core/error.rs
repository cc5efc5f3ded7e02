//! # Common Error Types
//!
//! Consolidated error handling for the dashboard.
//!
//! Each layer owns a focused error enum; [`AppError`] is the umbrella the
//! binary and the app loop report through.
//!
//! ## Error Categories
//!
//! - **Api** ([`ApiError`]): a single authenticated request failed
//!   (timeout, HTTP status, decode, refresh handshake)
//! - **Refresh** ([`RefreshError`]): the parent did not deliver a new token
//! - **Gps** ([`GpsError`]): a domain call failed, with a user-facing message
//! - **Channel** ([`ChannelError`]): a message could not be posted to the parent
//! - **Storage** ([`StorageError`]): persisted state could not be read or written
//! - **Validation**: input rejected before any state changed
//!
//! ## Usage Pattern
//!
//! ```rust
//! use dashboard::core::error::{ApiError, GpsError};
//!
//! let err = GpsError::Groups(ApiError::Http {
//!     status: 500,
//!     status_text: "Internal Server Error".to_string(),
//!     body: "boom".to_string(),
//! });
//! assert_eq!(err.code(), "GROUPS_LOAD_FAILED");
//! assert!(err.user_message().starts_with("Failed to load groups"));
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure of one call through [`crate::services::api::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response arrived within the configured timeout.
    #[error("Request timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The server answered 401 and no further refresh was attempted.
    #[error("HTTP 401: Unauthorized - {body}")]
    Unauthorized { body: String },

    /// Any other non-2xx response.
    #[error("HTTP {status}: {status_text} - {body}")]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// A 401 triggered a refresh that did not produce a new token.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] RefreshError),

    /// Network level failure before a response was received.
    #[error("Network error: {0}")]
    Transport(String),

    /// The 2xx body was not the expected JSON.
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}

/// Reasons a token refresh round-trip with the parent failed.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// No new, non-empty token arrived in time.
    #[error("no new token received within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The refresh request could not be posted.
    #[error("unable to request a token from the parent: {0}")]
    Post(#[source] ChannelError),

    /// The session was dropped while waiting.
    #[error("session closed while waiting for a token")]
    SessionClosed,
}

/// Domain call failures, each with a user-facing message.
#[derive(Debug, Error)]
pub enum GpsError {
    #[error("Failed to load groups: {0}")]
    Groups(#[source] ApiError),

    #[error("Failed to load vehicles for group {group_code}: {source}")]
    Vehicles {
        group_code: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to load vehicle {vehicle_code}: {source}")]
    Vehicle {
        vehicle_code: String,
        #[source]
        source: ApiError,
    },
}

impl GpsError {
    /// Message suitable for the status area and for `GPS_ERROR` payloads.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Stable code for `GPS_ERROR` payloads.
    pub fn code(&self) -> &'static str {
        match self {
            GpsError::Groups(_) => "GROUPS_LOAD_FAILED",
            GpsError::Vehicles { .. } => "VEHICLES_LOAD_FAILED",
            GpsError::Vehicle { .. } => "VEHICLE_LOAD_FAILED",
        }
    }

    /// The underlying request failure.
    pub fn api_error(&self) -> &ApiError {
        match self {
            GpsError::Groups(source) => source,
            GpsError::Vehicles { source, .. } => source,
            GpsError::Vehicle { source, .. } => source,
        }
    }
}

/// Posting to the parent context failed.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no parent context attached")]
    Detached,

    #[error("failed to encode message: {0}")]
    Encode(String),

    #[error("failed to deliver message: {0}")]
    Io(String),
}

/// Persisted state could not be read or written.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("storage encoding error: {0}")]
    Encode(String),
}

/// Application-wide error type.
///
/// Layer errors convert into it with `?`; the binary reports it through
/// `anyhow` at the very edge.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("GPS error: {0}")]
    Gps(#[from] GpsError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Input rejected before any state changed.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::Timeout(Duration::from_secs(12)).to_string(),
            "Request timeout after 12000ms"
        );
        assert_eq!(
            ApiError::Unauthorized { body: "expired".to_string() }.to_string(),
            "HTTP 401: Unauthorized - expired"
        );
        let http = ApiError::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            body: String::new(),
        };
        assert_eq!(http.to_string(), "HTTP 503: Service Unavailable - ");
        assert_eq!(http.status(), Some(503));
    }

    #[test]
    fn test_refresh_failure_wraps_reason() {
        let err = ApiError::RefreshFailed(RefreshError::Timeout(Duration::from_secs(10)));
        assert_eq!(
            err.to_string(),
            "Token refresh failed: no new token received within 10000ms"
        );
        assert_eq!(err.status(), None);
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_gps_error_messages() {
        let err = GpsError::Vehicles {
            group_code: "SAGU".to_string(),
            source: ApiError::Timeout(Duration::from_secs(12)),
        };
        assert_eq!(err.code(), "VEHICLES_LOAD_FAILED");
        assert_eq!(
            err.user_message(),
            "Failed to load vehicles for group SAGU: Request timeout after 12000ms"
        );
        assert!(err.api_error().is_timeout());
    }

    #[test]
    fn test_app_error_conversion() {
        let app: AppError = ChannelError::Detached.into();
        assert_eq!(app.to_string(), "Channel error: no parent context attached");
    }
}
