//! # Message Types
//!
//! Envelope and payload structures exchanged between the embedding parent
//! context and the dashboard frame.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value stamped into `source` on every frame→parent message.
pub const MESSAGE_SOURCE: &str = "gps-dashboard";

/// Attribute on the host frame element that carries the selected group code.
pub const GROUP_CODE_ATTRIBUTE: &str = "data-group-code";

/// Which way a message travels across the frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ParentToFrame,
    FrameToParent,
}

/// Closed set of message types understood by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "GPS_SET_TOKEN")]
    SetToken,
    #[serde(rename = "GPS_SET_GROUP")]
    SetGroup,
    #[serde(rename = "GPS_REQUEST_TOKEN")]
    RequestToken,
    #[serde(rename = "GPS_REQUEST_GROUP")]
    RequestGroup,
    #[serde(rename = "GPS_TOKEN_REFRESH")]
    TokenRefresh,
    #[serde(rename = "GPS_IFRAME_READY")]
    IframeReady,
    #[serde(rename = "GPS_STATS_UPDATE")]
    StatsUpdate,
    #[serde(rename = "GPS_ERROR")]
    Error,
    #[serde(rename = "GPS_LOG")]
    Log,
}

impl MessageType {
    pub const ALL: [MessageType; 9] = [
        MessageType::SetToken,
        MessageType::SetGroup,
        MessageType::RequestToken,
        MessageType::RequestGroup,
        MessageType::TokenRefresh,
        MessageType::IframeReady,
        MessageType::StatsUpdate,
        MessageType::Error,
        MessageType::Log,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::SetToken => "GPS_SET_TOKEN",
            MessageType::SetGroup => "GPS_SET_GROUP",
            MessageType::RequestToken => "GPS_REQUEST_TOKEN",
            MessageType::RequestGroup => "GPS_REQUEST_GROUP",
            MessageType::TokenRefresh => "GPS_TOKEN_REFRESH",
            MessageType::IframeReady => "GPS_IFRAME_READY",
            MessageType::StatsUpdate => "GPS_STATS_UPDATE",
            MessageType::Error => "GPS_ERROR",
            MessageType::Log => "GPS_LOG",
        }
    }

    /// Look up a type by its wire name.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }

    pub fn direction(&self) -> Direction {
        match self {
            MessageType::SetToken | MessageType::SetGroup => Direction::ParentToFrame,
            _ => Direction::FrameToParent,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol envelope: `{ type, source?, timestamp?, payload? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Message {
    /// Render the envelope as a JSON value, omitting absent fields.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.kind.as_str().to_string()));
        if let Some(source) = &self.source {
            map.insert("source".to_string(), Value::String(source.clone()));
        }
        if let Some(timestamp) = self.timestamp {
            map.insert("timestamp".to_string(), Value::from(timestamp));
        }
        if let Some(payload) = &self.payload {
            map.insert("payload".to_string(), payload.clone());
        }
        Value::Object(map)
    }
}

/// `GPS_SET_TOKEN` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTokenPayload {
    pub token: String,
}

/// `GPS_SET_GROUP` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGroupPayload {
    pub group_code: String,
}

/// Why the frame is asking for a new token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshReason {
    #[serde(rename = "401_unauthorized")]
    Unauthorized,
}

impl RefreshReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshReason::Unauthorized => "401_unauthorized",
        }
    }
}

/// `GPS_TOKEN_REFRESH` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshPayload {
    pub reason: RefreshReason,
}

/// `GPS_IFRAME_READY` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IframeReadyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
}

/// Data source health reported to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsStatus {
    Online,
    Offline,
    Error,
}

impl StatsStatus {
    pub const ALL: [StatsStatus; 3] = [StatsStatus::Online, StatsStatus::Offline, StatsStatus::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatsStatus::Online => "online",
            StatsStatus::Offline => "offline",
            StatsStatus::Error => "error",
        }
    }
}

/// `GPS_STATS_UPDATE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdatePayload {
    pub vehicle_count: u64,
    pub group_count: u64,
    /// RFC 3339 timestamp of the load that produced these numbers.
    pub last_update: String,
    pub status: StatsStatus,
}

/// `GPS_ERROR` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Severity of a forwarded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Info, LogLevel::Warn, LogLevel::Error, LogLevel::Debug];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
        }
    }
}

/// `GPS_LOG` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPayload {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
