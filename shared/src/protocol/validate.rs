//! # Message Validation
//!
//! Structural checks over untrusted JSON. Every function accepts any value
//! and answers `false` for anything that does not conform; none of them
//! panic. Receivers pass `event.data` through these before acting on it.

use chrono::DateTime;
use serde_json::Value;

use super::types::{LogLevel, MessageType, RefreshReason, StatsStatus};

/// True when `raw` is an object whose `type` equals `kind`.
pub fn is_kind(raw: &Value, kind: MessageType) -> bool {
    raw.get("type").and_then(Value::as_str) == Some(kind.as_str())
}

pub fn is_set_token(raw: &Value) -> bool {
    is_kind(raw, MessageType::SetToken)
}

pub fn is_set_group(raw: &Value) -> bool {
    is_kind(raw, MessageType::SetGroup)
}

pub fn is_request_token(raw: &Value) -> bool {
    is_kind(raw, MessageType::RequestToken)
}

pub fn is_request_group(raw: &Value) -> bool {
    is_kind(raw, MessageType::RequestGroup)
}

pub fn is_token_refresh(raw: &Value) -> bool {
    is_kind(raw, MessageType::TokenRefresh)
}

pub fn is_iframe_ready(raw: &Value) -> bool {
    is_kind(raw, MessageType::IframeReady)
}

pub fn is_stats_update(raw: &Value) -> bool {
    is_kind(raw, MessageType::StatsUpdate)
}

pub fn is_error(raw: &Value) -> bool {
    is_kind(raw, MessageType::Error)
}

pub fn is_log(raw: &Value) -> bool {
    is_kind(raw, MessageType::Log)
}

/// Any message the parent may send to the frame.
pub fn is_parent_to_frame(raw: &Value) -> bool {
    is_set_token(raw) || is_set_group(raw)
}

/// Any message the frame may send to the parent.
pub fn is_frame_to_parent(raw: &Value) -> bool {
    is_request_token(raw)
        || is_request_group(raw)
        || is_token_refresh(raw)
        || is_iframe_ready(raw)
        || is_stats_update(raw)
        || is_error(raw)
        || is_log(raw)
}

fn payload(raw: &Value, kind: MessageType) -> Option<&Value> {
    if !is_kind(raw, kind) {
        return None;
    }
    raw.get("payload").filter(|payload| payload.is_object())
}

fn non_empty_str<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn optional_str(payload: &Value, field: &str) -> bool {
    match payload.get(field) {
        None | Some(Value::Null) => true,
        Some(value) => value.is_string(),
    }
}

/// Envelope-level checks shared by every variant: `source` must be a string
/// and `timestamp` a number when present.
fn envelope_ok(raw: &Value) -> bool {
    optional_str(raw, "source")
        && match raw.get("timestamp") {
            None | Some(Value::Null) => true,
            Some(value) => value.is_number(),
        }
}

pub fn validate_set_token(raw: &Value) -> bool {
    envelope_ok(raw)
        && payload(raw, MessageType::SetToken)
            .and_then(|payload| non_empty_str(payload, "token"))
            .is_some()
}

pub fn validate_set_group(raw: &Value) -> bool {
    envelope_ok(raw)
        && payload(raw, MessageType::SetGroup)
            .and_then(|payload| non_empty_str(payload, "groupCode"))
            .is_some()
}

pub fn validate_request_token(raw: &Value) -> bool {
    envelope_ok(raw) && is_request_token(raw)
}

pub fn validate_request_group(raw: &Value) -> bool {
    envelope_ok(raw) && is_request_group(raw)
}

pub fn validate_token_refresh(raw: &Value) -> bool {
    envelope_ok(raw)
        && payload(raw, MessageType::TokenRefresh)
            .and_then(|payload| payload.get("reason"))
            .and_then(Value::as_str)
            == Some(RefreshReason::Unauthorized.as_str())
}

pub fn validate_iframe_ready(raw: &Value) -> bool {
    if !envelope_ok(raw) || !is_iframe_ready(raw) {
        return false;
    }
    let payload = match raw.get("payload") {
        None | Some(Value::Null) => return true,
        Some(payload) if payload.is_object() => payload,
        Some(_) => return false,
    };
    let capabilities_ok = match payload.get("capabilities") {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.iter().all(Value::is_string),
        Some(_) => false,
    };
    optional_str(payload, "version") && capabilities_ok
}

pub fn validate_stats_update(raw: &Value) -> bool {
    let Some(payload) = payload(raw, MessageType::StatsUpdate) else {
        return false;
    };
    let counts_ok = ["vehicleCount", "groupCount"]
        .iter()
        .all(|field| payload.get(*field).and_then(Value::as_u64).is_some());
    let last_update_ok = payload
        .get("lastUpdate")
        .and_then(Value::as_str)
        .is_some_and(|value| DateTime::parse_from_rfc3339(value).is_ok());
    let status_ok = payload
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|value| StatsStatus::ALL.iter().any(|status| status.as_str() == value));
    envelope_ok(raw) && counts_ok && last_update_ok && status_ok
}

pub fn validate_error(raw: &Value) -> bool {
    let Some(payload) = payload(raw, MessageType::Error) else {
        return false;
    };
    envelope_ok(raw)
        && payload.get("message").is_some_and(Value::is_string)
        && optional_str(payload, "code")
}

pub fn validate_log(raw: &Value) -> bool {
    let Some(payload) = payload(raw, MessageType::Log) else {
        return false;
    };
    let level_ok = payload
        .get("level")
        .and_then(Value::as_str)
        .is_some_and(|value| LogLevel::ALL.iter().any(|level| level.as_str() == value));
    envelope_ok(raw) && level_ok && payload.get("message").is_some_and(Value::is_string)
}

/// Validate against whichever variant `type` names. Unknown types fail.
pub fn validate(raw: &Value) -> bool {
    let Some(kind) = raw.get("type").and_then(Value::as_str).and_then(MessageType::parse) else {
        return false;
    };
    match kind {
        MessageType::SetToken => validate_set_token(raw),
        MessageType::SetGroup => validate_set_group(raw),
        MessageType::RequestToken => validate_request_token(raw),
        MessageType::RequestGroup => validate_request_group(raw),
        MessageType::TokenRefresh => validate_token_refresh(raw),
        MessageType::IframeReady => validate_iframe_ready(raw),
        MessageType::StatsUpdate => validate_stats_update(raw),
        MessageType::Error => validate_error(raw),
        MessageType::Log => validate_log(raw),
    }
}
