//! # Time Utilities
//!
//! Utilities for time formatting and manipulation using chrono.

use chrono::{DateTime, Duration, Utc};

/// Format string for the upstream history window: minute resolution, UTC,
/// no seconds and no zone suffix.
pub const UPSTREAM_MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format time as `YYYY-MM-DDTHH:mm` (UTC), truncating seconds.
pub fn format_upstream_minute(time: DateTime<Utc>) -> String {
    time.format(UPSTREAM_MINUTE_FORMAT).to_string()
}

/// The window `[end - length, end]`.
pub fn trailing_window(end: DateTime<Utc>, length: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    (end - length, end)
}

/// Parse RFC3339 string to UTC DateTime.
pub fn parse_utc(moment: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(moment)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::FailToDateParse(moment.to_string()))
}

// region:    --- Error
#[derive(Debug)]
pub enum Error {
    FailToDateParse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error
