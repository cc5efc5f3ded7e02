//! # Inbound Decoding
//!
//! Turns an untrusted parent message into credential updates. Decoding runs
//! an explicit, ordered list of adapters; each one validates its shape
//! before accepting. The list is the entire acceptance surface.
//!
//! ```text
//! 1. GPS_SET_TOKEN   { type, payload: { token } }
//! 2. GPS_SET_GROUP   { type, payload: { groupCode } }
//! 3. legacy token    { access_token }
//! 4. legacy group    { group_code }
//! ```
//!
//! Legacy parents may send `{ access_token, group_code }` in one message,
//! which yields both updates.

use serde_json::Value;

use super::validate::{validate_set_group, validate_set_token};

/// A credential carried by a parent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentUpdate {
    Token(String),
    Group(String),
}

/// A named decoder for one accepted inbound shape.
pub struct InboundAdapter {
    pub name: &'static str,
    pub decode: fn(&Value) -> Option<ParentUpdate>,
}

/// Adapters in the order they are tried.
pub const INBOUND_ADAPTERS: &[InboundAdapter] = &[
    InboundAdapter {
        name: "GPS_SET_TOKEN",
        decode: typed_set_token,
    },
    InboundAdapter {
        name: "GPS_SET_GROUP",
        decode: typed_set_group,
    },
    InboundAdapter {
        name: "legacy access_token",
        decode: legacy_access_token,
    },
    InboundAdapter {
        name: "legacy group_code",
        decode: legacy_group_code,
    },
];

fn payload_str(raw: &Value, field: &str) -> Option<String> {
    raw.get("payload")?.get(field)?.as_str().map(str::to_string)
}

fn typed_set_token(raw: &Value) -> Option<ParentUpdate> {
    if !validate_set_token(raw) {
        return None;
    }
    payload_str(raw, "token").map(ParentUpdate::Token)
}

fn typed_set_group(raw: &Value) -> Option<ParentUpdate> {
    if !validate_set_group(raw) {
        return None;
    }
    payload_str(raw, "groupCode").map(ParentUpdate::Group)
}

fn bare_field(raw: &Value, field: &str) -> Option<String> {
    raw.as_object()?
        .get(field)?
        .as_str()
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

fn legacy_access_token(raw: &Value) -> Option<ParentUpdate> {
    bare_field(raw, "access_token").map(ParentUpdate::Token)
}

fn legacy_group_code(raw: &Value) -> Option<ParentUpdate> {
    bare_field(raw, "group_code").map(ParentUpdate::Group)
}

/// Decode every update the message carries, in adapter order. Unknown or
/// malformed messages decode to an empty list.
pub fn decode_parent_message(raw: &Value) -> Vec<ParentUpdate> {
    INBOUND_ADAPTERS
        .iter()
        .filter_map(|adapter| (adapter.decode)(raw))
        .collect()
}

/// Name of the first adapter that accepts `raw`, for diagnostics.
pub fn matching_adapter(raw: &Value) -> Option<&'static str> {
    INBOUND_ADAPTERS
        .iter()
        .find(|adapter| (adapter.decode)(raw).is_some())
        .map(|adapter| adapter.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::builders::{build_set_group, build_set_token};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_typed_messages_decode() {
        assert_eq!(
            decode_parent_message(&build_set_token("abc123").to_value()),
            vec![ParentUpdate::Token("abc123".to_string())]
        );
        assert_eq!(
            decode_parent_message(&build_set_group("SAGU").to_value()),
            vec![ParentUpdate::Group("SAGU".to_string())]
        );
    }

    #[test]
    fn test_legacy_shapes_decode() {
        assert_eq!(
            decode_parent_message(&json!({ "access_token": "tok" })),
            vec![ParentUpdate::Token("tok".to_string())]
        );
        assert_eq!(
            decode_parent_message(&json!({ "group_code": "G1" })),
            vec![ParentUpdate::Group("G1".to_string())]
        );
    }

    #[test]
    fn test_combined_legacy_message_yields_both() {
        assert_eq!(
            decode_parent_message(&json!({ "access_token": "tok", "group_code": "G1" })),
            vec![
                ParentUpdate::Token("tok".to_string()),
                ParentUpdate::Group("G1".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_messages_decode_to_nothing() {
        let rejected = [
            Value::Null,
            json!("access_token"),
            json!([{ "access_token": "tok" }]),
            json!({ "access_token": "" }),
            json!({ "access_token": 12 }),
            json!({ "group_code": null }),
            json!({ "token": "tok" }),
            json!({ "type": "GPS_SET_TOKEN", "payload": { "token": "" } }),
            json!({ "type": "GPS_SET_GROUP", "payload": {} }),
            json!({ "type": "request_access_token" }),
            json!({ "type": "GPS_REQUEST_TOKEN" }),
        ];
        for raw in rejected {
            assert_eq!(decode_parent_message(&raw), Vec::new(), "{raw} decoded");
            assert_eq!(matching_adapter(&raw), None);
        }
    }

    #[test]
    fn test_matching_adapter_names() {
        assert_eq!(matching_adapter(&build_set_token("a").to_value()), Some("GPS_SET_TOKEN"));
        assert_eq!(matching_adapter(&json!({ "group_code": "G" })), Some("legacy group_code"));
    }
}
