//! # Services Module
//!
//! External service integrations.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 dashboard                    │
//! │                                              │
//! │   GpsService ──► ApiClient ──► HttpTransport │
//! │                     │                        │
//! │                     └── Session (token)      │
//! └─────────────────────────────┼────────────────┘
//!                               │ HTTPS / JSON
//!                               ▼
//!                  ┌──────────────────────────┐
//!                  │   GPS API (Orion auth)   │
//!                  │   /groups                │
//!                  │   /vehicles/group/{code} │
//!                  │   /vehicles/{code}       │
//!                  │   /vehicles/{code}/history│
//!                  └──────────────────────────┘
//! ```

pub mod api;
