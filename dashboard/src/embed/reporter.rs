//! # Parent Reporter
//!
//! Outbound status messages: readiness, stats, errors and forwarded logs.
//! Nothing is posted unless the dashboard is embedded (production mode with
//! an attached parent). Post failures are logged and never propagate.

use std::sync::Arc;

use serde_json::{json, Value};
use shared::protocol::{build_error, build_iframe_ready, build_log, build_stats_update, LogLevel, Message, StatsStatus};

use super::channel::ParentChannel;
use crate::core::error::GpsError;
use crate::session::{AppMode, Session};

/// Features announced in `GPS_IFRAME_READY`.
pub const CAPABILITIES: &[&str] = &["token-refresh", "stats-update", "error-report", "log-forwarding"];

pub struct ParentReporter {
    parent: Arc<dyn ParentChannel>,
    session: Arc<Session>,
}

impl ParentReporter {
    pub fn new(parent: Arc<dyn ParentChannel>, session: Arc<Session>) -> Self {
        Self { parent, session }
    }

    pub fn is_embedded(&self) -> bool {
        self.parent.is_attached() && self.session.mode() == AppMode::Production
    }

    pub fn ready(&self) -> bool {
        let capabilities = CAPABILITIES.iter().map(|c| c.to_string()).collect();
        self.send(build_iframe_ready(
            Some(env!("CARGO_PKG_VERSION").to_string()),
            Some(capabilities),
        ))
    }

    pub fn stats(&self, vehicle_count: usize, group_count: usize, status: StatsStatus) -> bool {
        self.send(build_stats_update(vehicle_count as u64, group_count as u64, status))
    }

    pub fn error(&self, err: &GpsError) -> bool {
        let details = err.api_error().status().map(|status| json!({ "status": status }));
        self.send(build_error(err.user_message(), Some(err.code().to_string()), details))
    }

    pub fn log(&self, level: LogLevel, message: &str, data: Option<Value>) -> bool {
        self.send(build_log(level, message, data))
    }

    fn send(&self, message: Message) -> bool {
        if !self.is_embedded() {
            return false;
        }
        match self.parent.post(&message) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(kind = %message.kind, error = %e, "Failed to report to parent");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ApiError;
    use crate::testing::RecordingChannel;
    use pretty_assertions::assert_eq;
    use shared::protocol::{validate_error, validate_iframe_ready, validate_stats_update};

    fn reporter(mode: AppMode) -> (ParentReporter, Arc<RecordingChannel>) {
        let parent = RecordingChannel::new();
        let session = Arc::new(Session::new(mode));
        (ParentReporter::new(parent.clone(), session), parent)
    }

    #[test]
    fn test_nothing_posted_outside_production() {
        let (reporter, parent) = reporter(AppMode::Dev);
        assert!(!reporter.ready());
        assert!(!reporter.stats(1, 1, StatsStatus::Online));
        assert!(parent.messages().is_empty());
    }

    #[test]
    fn test_ready_and_stats_are_valid_messages() {
        let (reporter, parent) = reporter(AppMode::Production);

        assert!(reporter.ready());
        assert!(reporter.stats(12, 3, StatsStatus::Online));

        let messages = parent.messages();
        assert!(validate_iframe_ready(&messages[0]));
        assert_eq!(messages[0]["payload"]["capabilities"][0], "token-refresh");
        assert!(validate_stats_update(&messages[1]));
        assert_eq!(messages[1]["payload"]["vehicleCount"], 12);
        assert_eq!(messages[1]["payload"]["status"], "online");
    }

    #[test]
    fn test_error_carries_code_and_status() {
        let (reporter, parent) = reporter(AppMode::Production);
        let err = GpsError::Groups(ApiError::Http {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            body: String::new(),
        });

        assert!(reporter.error(&err));

        let message = &parent.messages()[0];
        assert!(validate_error(message));
        assert_eq!(message["payload"]["code"], "GROUPS_LOAD_FAILED");
        assert_eq!(message["payload"]["details"]["status"], 500);
    }

    #[test]
    fn test_post_failure_is_swallowed() {
        let (reporter, parent) = reporter(AppMode::Production);
        parent.fail_posts(true);
        assert!(!reporter.log(LogLevel::Info, "hello", None));
    }
}
