//! # Message Builders
//!
//! One constructor per message type. Frame→parent messages are stamped with
//! [`MESSAGE_SOURCE`] and the current time; parent→frame messages carry only
//! `type` and `payload`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::types::*;

/// Legacy request type understood by older parent handlers.
pub const LEGACY_REQUEST_ACCESS_TOKEN: &str = "request_access_token";
/// Legacy request type understood by older parent handlers.
pub const LEGACY_REQUEST_GROUP_CODE: &str = "request_group_code";

fn payload_value<T: Serialize>(payload: &T) -> Value {
    // Payload structs hold only strings, numbers and JSON values.
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

fn inbound(kind: MessageType, payload: Option<Value>) -> Message {
    Message {
        kind,
        source: None,
        timestamp: None,
        payload,
    }
}

fn outbound(kind: MessageType, payload: Option<Value>) -> Message {
    Message {
        kind,
        source: Some(MESSAGE_SOURCE.to_string()),
        timestamp: Some(Utc::now().timestamp_millis()),
        payload,
    }
}

/// `GPS_SET_TOKEN` (parent → frame).
pub fn build_set_token(token: impl Into<String>) -> Message {
    let payload = SetTokenPayload { token: token.into() };
    inbound(MessageType::SetToken, Some(payload_value(&payload)))
}

/// `GPS_SET_GROUP` (parent → frame).
pub fn build_set_group(group_code: impl Into<String>) -> Message {
    let payload = SetGroupPayload {
        group_code: group_code.into(),
    };
    inbound(MessageType::SetGroup, Some(payload_value(&payload)))
}

/// `GPS_REQUEST_TOKEN` (frame → parent).
pub fn build_request_token() -> Message {
    outbound(MessageType::RequestToken, None)
}

/// `GPS_REQUEST_GROUP` (frame → parent).
pub fn build_request_group() -> Message {
    outbound(MessageType::RequestGroup, None)
}

/// `GPS_TOKEN_REFRESH` (frame → parent), sent after an upstream 401.
pub fn build_token_refresh() -> Message {
    let payload = TokenRefreshPayload {
        reason: RefreshReason::Unauthorized,
    };
    outbound(MessageType::TokenRefresh, Some(payload_value(&payload)))
}

/// `GPS_IFRAME_READY` (frame → parent).
pub fn build_iframe_ready(version: Option<String>, capabilities: Option<Vec<String>>) -> Message {
    let payload = IframeReadyPayload { version, capabilities };
    outbound(MessageType::IframeReady, Some(payload_value(&payload)))
}

/// `GPS_STATS_UPDATE` (frame → parent) stamped with the current time.
pub fn build_stats_update(vehicle_count: u64, group_count: u64, status: StatsStatus) -> Message {
    build_stats_update_at(vehicle_count, group_count, status, Utc::now())
}

/// `GPS_STATS_UPDATE` with an explicit `lastUpdate`.
pub fn build_stats_update_at(
    vehicle_count: u64,
    group_count: u64,
    status: StatsStatus,
    last_update: DateTime<Utc>,
) -> Message {
    let payload = StatsUpdatePayload {
        vehicle_count,
        group_count,
        last_update: last_update.to_rfc3339(),
        status,
    };
    outbound(MessageType::StatsUpdate, Some(payload_value(&payload)))
}

/// `GPS_ERROR` (frame → parent).
pub fn build_error(message: impl Into<String>, code: Option<String>, details: Option<Value>) -> Message {
    let payload = ErrorPayload {
        message: message.into(),
        code,
        details,
    };
    outbound(MessageType::Error, Some(payload_value(&payload)))
}

/// `GPS_LOG` (frame → parent).
pub fn build_log(level: LogLevel, message: impl Into<String>, data: Option<Value>) -> Message {
    let payload = LogPayload {
        level,
        message: message.into(),
        data,
    };
    outbound(MessageType::Log, Some(payload_value(&payload)))
}

/// Legacy `{ type: "request_access_token" }`.
pub fn build_legacy_token_request() -> Value {
    json!({ "type": LEGACY_REQUEST_ACCESS_TOKEN })
}

/// Legacy `{ type: "request_group_code" }`.
pub fn build_legacy_group_request() -> Value {
    json!({ "type": LEGACY_REQUEST_GROUP_CODE })
}
