//! # GPS Dashboard - Library Root
//!
//! Core of an embeddable GPS vehicle-tracking dashboard. The dashboard runs
//! either standalone (**dev** mode, user-entered token) or embedded in a
//! host page (**production** mode, credentials pushed by the parent).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   dashboard (this crate)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  embed     - mode controller, handshake, parent channel     │
//! │  services  - API client (timeout, 401 refresh) + GPS calls  │
//! │  session   - shared token and mode (tokio watch)            │
//! │  app       - reloads fleet data when credentials change     │
//! └─────────────────────────────────────────────────────────────┘
//!          │  JSON messages                 │ HTTPS
//!          ▼                                ▼
//! ┌─────────────────┐              ┌─────────────────────┐
//! │   Parent page   │              │   GPS upstream API  │
//! └─────────────────┘              └─────────────────────┘
//! ```
//!
//! Wire types for the parent protocol and the GPS DTOs live in `shared`.
//!
//! ## Module Structure
//!
//! - **app**: orchestrates loads and reports stats/errors to the parent
//! - **config**: environment configuration (`DashboardConfig`)
//! - **core**: error types and the transport/GPS traits
//! - **debug**: tracing setup (stderr + daily rolling file)
//! - **embed**: `ModeController`, parent channels, host-frame observer
//! - **services**: `ApiClient`, `GpsService`, reqwest transport
//! - **session**: `Session` and `AppMode`
//! - **storage**: persisted key/value settings
//!
//! ## Testing
//!
//! ```bash
//! cargo test -p dashboard
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod debug;
pub mod embed;
pub mod services;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;

pub use app::{App, AppOptions, DashboardView};
pub use core::{AppError, Result};
pub use session::{AppMode, Session};
