//! # Service Traits
//!
//! Traits for dependency injection, enabling better testability and modularity.

use async_trait::async_trait;
use shared::dto::{Group, Position, Vehicle};

use super::error::{ApiError, GpsError};
use crate::services::api::transport::{HttpRequest, HttpResponse};

/// Sends one HTTP request.
///
/// Implemented by [`crate::services::api::ReqwestTransport`]; tests script
/// responses through their own implementation.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// GPS domain operations used by the app loop.
#[async_trait]
pub trait GpsApi: Send + Sync {
    /// All vehicle groups visible to the token.
    async fn list_groups(&self) -> Result<Vec<Group>, GpsError>;

    /// Vehicles of one group.
    async fn vehicles_by_group(&self, group_code: &str) -> Result<Vec<Vehicle>, GpsError>;

    /// One vehicle by code.
    async fn vehicle(&self, vehicle_code: &str) -> Result<Vehicle, GpsError>;

    /// Vehicles of every group, concatenated in group order.
    async fn all_vehicles(&self) -> Result<Vec<Vehicle>, GpsError>;

    /// The last `limit` positions of the trailing history window.
    /// Never fails; errors yield an empty list.
    async fn vehicle_history(&self, vehicle_code: &str, limit: usize) -> Vec<Position>;
}
