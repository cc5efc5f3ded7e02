//! # GPS API Client Module
//!
//! HTTP access to the GPS fleet API.
//!
//! ## Module Structure
//!
//! ```text
//! api/
//! ├── mod.rs        - Module exports and documentation
//! ├── transport.rs  - Request/response types and the reqwest transport
//! ├── client.rs     - ApiClient: auth header, timeout, refresh-and-retry
//! └── gps.rs        - GpsService: groups, vehicles, history
//! ```

pub mod client;
pub mod gps;
pub mod transport;

pub use client::{
    ApiClient, ApiResponse, ClientOptions, RequestConfig, DEFAULT_AUTH_SCHEME, DEFAULT_REFRESH_WAIT,
    DEFAULT_REQUEST_TIMEOUT, MAX_REFRESH_RETRIES,
};
pub use gps::{coerce_list, last_positions, GpsService, DEFAULT_BASE_URL, DEFAULT_HISTORY_LIMIT};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport};
