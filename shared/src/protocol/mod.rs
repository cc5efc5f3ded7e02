//! # Parent ↔ Frame Message Protocol
//!
//! Message contract between the dashboard and the document that embeds it.
//!
//! ## Module Organization
//!
//! - [`types`] - Envelope, message types and payload structs
//! - [`builders`] - One constructor per message type
//! - [`validate`] - Structural validators and type predicates
//! - [`inbound`] - Ordered adapters decoding parent messages into updates
//!
//! ## Wire Format
//!
//! ```text
//! { "type": "GPS_SET_TOKEN", "payload": { "token": "eyJ..." } }
//! { "type": "GPS_REQUEST_GROUP", "source": "gps-dashboard", "timestamp": 1757929968000 }
//! ```
//!
//! | type                | direction      | payload                                         |
//! |---------------------|----------------|-------------------------------------------------|
//! | `GPS_SET_TOKEN`     | parent → frame | `{ token }`                                     |
//! | `GPS_SET_GROUP`     | parent → frame | `{ groupCode }`                                 |
//! | `GPS_REQUEST_TOKEN` | frame → parent | none                                            |
//! | `GPS_REQUEST_GROUP` | frame → parent | none                                            |
//! | `GPS_TOKEN_REFRESH` | frame → parent | `{ reason: "401_unauthorized" }`                |
//! | `GPS_IFRAME_READY`  | frame → parent | `{ version?, capabilities? }`                   |
//! | `GPS_STATS_UPDATE`  | frame → parent | `{ vehicleCount, groupCount, lastUpdate, status }` |
//! | `GPS_ERROR`         | frame → parent | `{ message, code?, details? }`                  |
//! | `GPS_LOG`           | frame → parent | `{ level, message, data? }`                     |

pub mod builders;
pub mod inbound;
pub mod types;
pub mod validate;

pub use builders::*;
pub use inbound::{decode_parent_message, matching_adapter, ParentUpdate, INBOUND_ADAPTERS};
pub use types::*;
pub use validate::*;
