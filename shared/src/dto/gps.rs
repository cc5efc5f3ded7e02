//! # GPS Data Transfer Objects
//!
//! Read-only projections of the upstream GPS API responses. Field names are
//! camelCase on the wire. Fields the upstream sometimes omits or sends as
//! `null` default rather than failing the whole list.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `null` and a missing field both become `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Vehicle group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Coordinates in millionths of a degree
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    #[serde(default, deserialize_with = "null_as_default")]
    pub latitude_e6: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub longitude_e6: i64,
}

/// One sampled position from a vehicle's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed: f64,
    pub latitude_e6: i64,
    pub longitude_e6: i64,
}

impl Position {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude_e6: self.latitude_e6,
            longitude_e6: self.longitude_e6,
        }
    }
}

/// History window for one vehicle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub vehicle_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from_utc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to_utc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub positions: Vec<Position>,
}

/// Vehicle with its last known state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub group_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Licence plate
    #[serde(default, deserialize_with = "null_as_default")]
    pub spz: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub speed: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub battery_percentage: f64,
    /// Meters
    #[serde(default, deserialize_with = "null_as_default")]
    pub odometer: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_position: Coordinates,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_position_timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refueling_cards: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_positions: Option<Vec<Position>>,
}
