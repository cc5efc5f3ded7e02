//! # Utilities Library
//!
//! Shared utility functions for environment variables, time formatting, and validation.

pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use envs::{get_env, get_env_bool, get_env_or, get_env_parse, get_env_parse_or};
pub use time::{format_upstream_minute, now_utc, parse_utc, trailing_window};
pub use validation::{normalize_non_empty, validate_not_empty};
