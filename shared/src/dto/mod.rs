//! # Data Transfer Objects (DTOs)
//!
//! Data structures received from the upstream GPS REST API.
//!
//! ## Module Organization
//!
//! - [`gps`] - Groups, vehicles, positions and vehicle history
//!
//! ## Serialization Format
//!
//! - **Field naming**: camelCase on the wire (`#[serde(rename_all = "camelCase")]`)
//! - **Optional fields**: Omitted when `None` using `#[serde(skip_serializing_if = "Option::is_none")]`
//! - **Missing fields**: Defaulted where the upstream is known to omit them
//!
//! ## Example JSON
//!
//! ```text
//! GET /v1/vehicles/group/SAGU
//! Authorization: Orion eyJ0eXAiOiJKV1Qi...
//!
//! [
//!   {
//!     "code": "V001",
//!     "groupCode": "SAGU",
//!     "name": "Octavia",
//!     "spz": "1AB 2345",
//!     "speed": 54,
//!     "lastPosition": { "latitudeE6": 49195060, "longitudeE6": 16606837 },
//!     "lastPositionTimestamp": "2025-09-15T10:30:00Z"
//!   }
//! ]
//! ```

pub mod gps;

pub use gps::*;
