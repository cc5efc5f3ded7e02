//! # Shared Utility Functions
//!
//! Display helpers for upstream GPS values.
//!
//! ## Coordinates
//!
//! The upstream API sends coordinates as integers in millionths of a degree:
//! - [`e6_to_degrees`] - Convert an E6 integer to degrees
//! - [`format_coordinates`] - Render a lat/lng pair for display
//!
//! ## Distances
//!
//! - [`format_odometer`] - Render an odometer reading in kilometres
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::format_coordinates;
//! use shared::dto::Coordinates;
//!
//! let brno = Coordinates { latitude_e6: 49_195_060, longitude_e6: 16_606_837 };
//! assert_eq!(format_coordinates(&brno), "49.195060, 16.606837");
//! ```

use crate::dto::Coordinates;

/// Convert a coordinate in millionths of a degree to degrees.
///
/// # Examples
///
/// ```rust
/// use shared::utils::e6_to_degrees;
///
/// assert_eq!(e6_to_degrees(49_195_060), 49.19506);
/// assert_eq!(e6_to_degrees(-1_500_000), -1.5);
/// ```
pub fn e6_to_degrees(value: i64) -> f64 {
    value as f64 / 1_000_000.0
}

/// Format a coordinate pair as `"lat, lng"` with six decimals.
pub fn format_coordinates(coordinates: &Coordinates) -> String {
    format!(
        "{:.6}, {:.6}",
        e6_to_degrees(coordinates.latitude_e6),
        e6_to_degrees(coordinates.longitude_e6)
    )
}

/// Format an odometer reading given in meters as kilometres with one decimal.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_odometer;
///
/// assert_eq!(format_odometer(120_500.0), "120.5 km");
/// ```
pub fn format_odometer(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_e6_to_degrees() {
        assert_eq!(e6_to_degrees(0), 0.0);
        assert_eq!(e6_to_degrees(1_000_000), 1.0);
        assert_eq!(e6_to_degrees(-16_606_837), -16.606837);
    }

    #[test]
    fn test_format_coordinates() {
        let coordinates = Coordinates {
            latitude_e6: 49_195_060,
            longitude_e6: 16_606_837,
        };
        assert_eq!(format_coordinates(&coordinates), "49.195060, 16.606837");
        assert_eq!(format_coordinates(&Coordinates::default()), "0.000000, 0.000000");
    }

    #[test]
    fn test_format_odometer() {
        assert_eq!(format_odometer(0.0), "0.0 km");
        assert_eq!(format_odometer(1_234.0), "1.2 km");
    }
}
