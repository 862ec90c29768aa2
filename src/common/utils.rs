//! Utility functions for peerkv

use crate::common::{Error, Result};

/// Validate key (must be non-empty, ASCII alphanumeric)
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key cannot be empty".into()));
    }

    if !is_alphanumeric(key) {
        return Err(Error::InvalidKey(format!(
            "{:?}: only ASCII letters and digits are allowed",
            key
        )));
    }

    Ok(())
}

/// Validate value (same rules as keys)
pub fn validate_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidValue("value cannot be empty".into()));
    }

    if !is_alphanumeric(value) {
        return Err(Error::InvalidValue(format!(
            "{:?}: only ASCII letters and digits are allowed",
            value
        )));
    }

    Ok(())
}

fn is_alphanumeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Parse a `KEY=VALUE` pair as accepted by the client CLI
pub fn parse_assignment(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| Error::InvalidValue(format!("{:?}: expected KEY=VALUE", s)))?;
    validate_key(key)?;
    validate_value(value)?;
    Ok((key.to_string(), value.to_string()))
}

/// Reject a missing or empty form field
pub fn required(field: Option<String>, name: &'static str) -> Result<String> {
    match field {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingField(name)),
    }
}
