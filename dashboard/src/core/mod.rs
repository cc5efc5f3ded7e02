//! # Core Abstractions
//!
//! Core traits and error types for dependency injection and better testability.
//!
//! ## Modules
//!
//! - **[`error`]**: Layer error enums and the umbrella [`AppError`]
//! - **[`service`]**: Service traits for dependency injection (`HttpTransport`, `GpsApi`)
//!
//! ## Dependency Injection
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dashboard::core::service::HttpTransport;
//! use dashboard::services::api::ReqwestTransport;
//!
//! // In production: the reqwest transport
//! let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
//! ```

pub mod error;
pub mod service;

pub use error::{ApiError, AppError, ChannelError, GpsError, RefreshError, Result, StorageError};
pub use service::{GpsApi, HttpTransport};
