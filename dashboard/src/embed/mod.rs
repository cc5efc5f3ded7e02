//! # Embedding
//!
//! Everything that concerns the context hosting the dashboard.
//!
//! ## Module Structure
//!
//! ```text
//! embed/
//! ├── mod.rs         - Module exports
//! ├── channel.rs     - ParentChannel trait, JSON-lines transport, inbound decoding
//! ├── frame.rs       - Host element attributes and the group attribute observer
//! ├── controller.rs  - Dev/production state machine and credential handshake
//! └── reporter.rs    - Readiness, stats, error and log reports to the parent
//! ```
//!
//! ## Data Flow
//!
//! ```text
//!  parent ──JSON──► forward_lines ──┐
//!                                   ├──► ControllerEvent ──► ModeController ──► ModeSnapshot
//!  frame attribute ─► observer ─────┘                            │
//!                                                                └──► GPS_REQUEST_* ──► parent
//! ```

pub mod channel;
pub mod controller;
pub mod frame;
pub mod reporter;

pub use channel::{events_from_message, forward_lines, DetachedChannel, LineChannel, ParentChannel};
pub use controller::{
    token_is_valid, ControllerEvent, ControllerOptions, GroupOrigin, ModeController, ModeSnapshot,
    DEFAULT_HANDSHAKE_INTERVAL,
};
pub use frame::{forward_group_attribute, AttributeObserver, FrameElement};
pub use reporter::{ParentReporter, CAPABILITIES};
