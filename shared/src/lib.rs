//! # Shared Contract Library
//!
//! This library defines the contracts the dashboard speaks on both of its
//! edges: the message protocol exchanged with an embedding parent context,
//! and the DTOs returned by the upstream GPS REST API.
//!
//! ## Structure
//!
//! - **[`protocol`]**: Parent ↔ frame messages
//!   - **[`protocol::types`]**: Envelope, message types, payloads
//!   - **[`protocol::builders`]**: Message constructors
//!   - **[`protocol::validate`]**: Validators and type predicates
//!   - **[`protocol::inbound`]**: Decoding parent messages into updates
//! - **[`dto`]**: Upstream API data
//!   - **[`dto::gps`]**: Groups, vehicles, positions, history
//! - **[`utils`]**: Display helpers for coordinates and distances
//!
//! ## Usage in the Frame
//!
//! ```rust
//! use shared::protocol::{decode_parent_message, ParentUpdate};
//! use serde_json::json;
//!
//! let raw = json!({ "type": "GPS_SET_TOKEN", "payload": { "token": "abc" } });
//! assert_eq!(decode_parent_message(&raw), vec![ParentUpdate::Token("abc".to_string())]);
//! ```
//!
//! ## Usage in a Parent Host
//!
//! ```rust
//! use shared::protocol::{build_set_group, validate_set_group};
//!
//! let message = build_set_group("SAGU");
//! assert!(validate_set_group(&message.to_value()));
//! ```

pub mod dto;
pub mod protocol;
pub mod utils;

// Wildcard re-exports: every item here is public contract
pub use dto::*;
pub use utils::*;
