//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Trim user input and reject it when nothing is left.
pub fn normalize_non_empty(value: &str, field_name: &str) -> Result<String, String> {
    validate_not_empty(value, field_name)?;
    Ok(value.trim().to_string())
}
