//! # GPS Endpoints
//!
//! Fleet data from the GPS API:
//!
//! | call                  | endpoint                                          |
//! |-----------------------|---------------------------------------------------|
//! | `list_groups`         | `GET {base}/groups`                               |
//! | `vehicles_by_group`   | `GET {base}/vehicles/group/{code}`                |
//! | `vehicle`             | `GET {base}/vehicles/{code}`                      |
//! | `vehicle_history`     | `GET {base}/vehicles/{code}/history?fromUtc&toUtc` |
//!
//! List endpoints that answer with something other than an array are
//! treated as empty.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use lib_utils::{format_upstream_minute, now_utc, trailing_window};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::dto::{Group, Position, Vehicle, VehicleHistory};

use super::client::{ApiClient, RequestConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::core::error::{ApiError, GpsError};
use crate::core::service::GpsApi;

pub const DEFAULT_BASE_URL: &str = "https://api-d.gpsguard.eu/v1";
pub const DEFAULT_HISTORY_LIMIT: usize = 3;
const HISTORY_WINDOW_HOURS: i64 = 24;

pub struct GpsService {
    api: Arc<ApiClient>,
    base_url: String,
    timeout: Duration,
}

impl GpsService {
    pub fn new(api: Arc<ApiClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            api,
            base_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_value(&self, url: String) -> Result<Value, ApiError> {
        let config = RequestConfig::get(url).timeout(self.timeout);
        Ok(self.api.request::<Value>(&config).await?.data)
    }

    async fn get_list<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>, ApiError> {
        coerce_list(self.get_value(url).await?)
    }

    /// History as of `now`; exposed so the window is testable.
    #[tracing::instrument(skip(self), fields(vehicle_code = %vehicle_code))]
    pub async fn vehicle_history_at(&self, vehicle_code: &str, limit: usize, now: DateTime<Utc>) -> Vec<Position> {
        let (from, to) = trailing_window(now, chrono::Duration::hours(HISTORY_WINDOW_HOURS));
        let url = format!(
            "{}?fromUtc={}&toUtc={}",
            self.url(&format!("/vehicles/{}/history", urlencoding::encode(vehicle_code))),
            urlencoding::encode(&format_upstream_minute(from)),
            urlencoding::encode(&format_upstream_minute(to)),
        );

        match self.get_list::<VehicleHistory>(url).await {
            Ok(histories) => {
                let positions = last_positions(histories, limit);
                tracing::debug!(count = positions.len(), "History loaded");
                positions
            }
            Err(e) => {
                tracing::warn!(error = %e, "History unavailable");
                Vec::new()
            }
        }
    }
}

/// Decode an array payload; anything else is an empty list.
pub fn coerce_list<T: DeserializeOwned>(data: Value) -> Result<Vec<T>, ApiError> {
    match data {
        Value::Array(_) => serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string())),
        other => {
            tracing::debug!(kind = json_kind(&other), "Expected a list, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// The last `limit` positions of the first history entry, oldest first.
pub fn last_positions(histories: Vec<VehicleHistory>, limit: usize) -> Vec<Position> {
    let Some(history) = histories.into_iter().next() else {
        return Vec::new();
    };
    let positions = history.positions;
    let skip = positions.len().saturating_sub(limit);
    positions.into_iter().skip(skip).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl GpsApi for GpsService {
    #[tracing::instrument(skip(self))]
    async fn list_groups(&self) -> Result<Vec<Group>, GpsError> {
        let groups = self
            .get_list::<Group>(self.url("/groups"))
            .await
            .map_err(GpsError::Groups)?;
        tracing::info!(count = groups.len(), "Groups loaded");
        Ok(groups)
    }

    #[tracing::instrument(skip(self), fields(group_code = %group_code))]
    async fn vehicles_by_group(&self, group_code: &str) -> Result<Vec<Vehicle>, GpsError> {
        let url = self.url(&format!("/vehicles/group/{}", urlencoding::encode(group_code)));
        let vehicles = self
            .get_list::<Vehicle>(url)
            .await
            .map_err(|source| GpsError::Vehicles {
                group_code: group_code.to_string(),
                source,
            })?;
        tracing::info!(count = vehicles.len(), "Vehicles loaded");
        Ok(vehicles)
    }

    #[tracing::instrument(skip(self), fields(vehicle_code = %vehicle_code))]
    async fn vehicle(&self, vehicle_code: &str) -> Result<Vehicle, GpsError> {
        let url = self.url(&format!("/vehicles/{}", urlencoding::encode(vehicle_code)));
        let wrap = |source| GpsError::Vehicle {
            vehicle_code: vehicle_code.to_string(),
            source,
        };
        let data = self.get_value(url).await.map_err(wrap)?;
        serde_json::from_value(data).map_err(|e| wrap(ApiError::Decode(e.to_string())))
    }

    async fn all_vehicles(&self) -> Result<Vec<Vehicle>, GpsError> {
        let groups = self.list_groups().await?;
        let per_group = try_join_all(groups.iter().map(|group| self.vehicles_by_group(&group.code))).await?;
        Ok(per_group.into_iter().flatten().collect())
    }

    async fn vehicle_history(&self, vehicle_code: &str, limit: usize) -> Vec<Position> {
        self.vehicle_history_at(vehicle_code, limit, now_utc()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api::client::ClientOptions;
    use crate::session::{AppMode, Session};
    use crate::testing::{respond, Scripted, ScriptedTransport};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BASE: &str = "https://api.test/v1/";

    fn service() -> (GpsService, Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new();
        let session = Arc::new(Session::new(AppMode::Dev));
        session.set_token("t1");
        let api = Arc::new(ApiClient::new(transport.clone(), session, ClientOptions::default()));
        (GpsService::new(api, BASE), transport)
    }

    fn positions(n: usize) -> Value {
        let positions: Vec<Value> = (0..n)
            .map(|i| json!({ "time": format!("t{i}"), "speed": i, "latitudeE6": i, "longitudeE6": i }))
            .collect();
        json!([{ "name": "Octavia", "vehicleCode": "V1", "positions": positions }])
    }

    #[tokio::test]
    async fn test_list_groups() {
        let (gps, transport) = service();
        transport.push("/groups", respond(200, r#"[{"code":"G1","name":"Brno"}]"#));

        let groups = gps.list_groups().await.expect("groups");

        assert_eq!(groups, vec![Group { code: "G1".to_string(), name: "Brno".to_string() }]);
        assert_eq!(transport.requests()[0].url, "https://api.test/v1/groups");
    }

    #[tokio::test]
    async fn test_non_array_payload_is_empty() {
        let (gps, transport) = service();
        transport.push("/groups", respond(200, r#"{"error":"weird"}"#));
        transport.push("/vehicles/group/G1", respond(200, "null"));

        assert!(gps.list_groups().await.expect("groups").is_empty());
        assert!(gps.vehicles_by_group("G1").await.expect("vehicles").is_empty());
    }

    #[tokio::test]
    async fn test_group_failure_has_readable_message() {
        let (gps, transport) = service();
        transport.push("/groups", respond(500, "down"));

        let err = gps.list_groups().await.unwrap_err();

        assert_eq!(err.user_message(), "Failed to load groups: HTTP 500: Internal Server Error - down");
    }

    #[tokio::test]
    async fn test_group_code_is_encoded() {
        let (gps, transport) = service();
        transport.push("/vehicles/group/", respond(200, "[]"));

        gps.vehicles_by_group("A B/C").await.expect("vehicles");

        assert_eq!(transport.requests()[0].url, "https://api.test/v1/vehicles/group/A%20B%2FC");
    }

    #[tokio::test]
    async fn test_single_vehicle() {
        let (gps, transport) = service();
        transport.push("/vehicles/V1", respond(200, r#"{"code":"V1","name":"Octavia","spz":"1AB 2345"}"#));
        transport.push("/vehicles/V2", respond(200, "[]"));

        let vehicle = gps.vehicle("V1").await.expect("vehicle");
        let err = gps.vehicle("V2").await.unwrap_err();

        assert_eq!(vehicle.spz, "1AB 2345");
        assert_eq!(err.code(), "VEHICLE_LOAD_FAILED");
        assert!(matches!(err.api_error(), ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_all_vehicles_flattens_groups() {
        // Arrange
        let (gps, transport) = service();
        transport.push("/groups", respond(200, r#"[{"code":"G1"},{"code":"G2"}]"#));
        transport.push("/vehicles/group/G1", respond(200, r#"[{"code":"V1"},{"code":"V2"}]"#));
        transport.push("/vehicles/group/G2", respond(200, r#"[{"code":"V3"}]"#));

        // Act
        let vehicles = gps.all_vehicles().await.expect("vehicles");

        // Assert
        let codes: Vec<_> = vehicles.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["V1", "V2", "V3"]);
    }

    #[tokio::test]
    async fn test_all_vehicles_fails_when_any_group_fails() {
        let (gps, transport) = service();
        transport.push("/groups", respond(200, r#"[{"code":"G1"},{"code":"G2"}]"#));
        transport.push("/vehicles/group/G1", respond(200, "[]"));
        transport.push("/vehicles/group/G2", respond(500, ""));

        let err = gps.all_vehicles().await.unwrap_err();

        assert!(matches!(err, GpsError::Vehicles { ref group_code, .. } if group_code == "G2"));
    }

    #[tokio::test]
    async fn test_history_keeps_last_positions_in_order() {
        // Arrange
        let (gps, transport) = service();
        transport.push("/history", respond(200, positions(10).to_string()));
        let now = Utc.with_ymd_and_hms(2025, 9, 15, 10, 30, 45).unwrap();

        // Act
        let history = gps.vehicle_history_at("V1", 3, now).await;

        // Assert
        let times: Vec<_> = history.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(times, vec!["t7", "t8", "t9"]);
        assert_eq!(
            transport.requests()[0].url,
            "https://api.test/v1/vehicles/V1/history?fromUtc=2025-09-14T10%3A30&toUtc=2025-09-15T10%3A30"
        );
    }

    #[tokio::test]
    async fn test_history_failure_is_empty() {
        let (gps, transport) = service();
        transport.push("/history", Scripted::Fail("reset".to_string()));

        assert!(gps.vehicle_history("V1", 3).await.is_empty());
    }

    #[test]
    fn test_last_positions_edges() {
        assert!(last_positions(Vec::new(), 3).is_empty());
        let histories: Vec<VehicleHistory> = serde_json::from_value(positions(2)).expect("history");
        assert_eq!(last_positions(histories.clone(), 5).len(), 2);
        assert!(last_positions(histories, 0).is_empty());
    }
}
