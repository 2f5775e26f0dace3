//! Input validation utilities.
//!
//! This module contains functions for validating user inputs before they are forwarded to the
//! upstream registry.

use crate::{TrialsError, TrialsResult};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Validates that a trial identifier is safe to embed in a registry URL path.
///
/// Registry identifiers look like `NCT01234567`. This function applies guardrails so that a
/// caller cannot smuggle path segments or query strings into the upstream request:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to ASCII letters and digits
///
/// # Errors
///
/// Returns a `TrialsError::InvalidInput` if the identifier is invalid.
pub fn validate_trial_id(id: &str) -> TrialsResult<()> {
    const MAX_TRIAL_ID_LEN: usize = 32;

    if id.trim().is_empty() {
        return Err(TrialsError::InvalidInput("trial ID cannot be empty".into()));
    }

    if id.len() > MAX_TRIAL_ID_LEN {
        return Err(TrialsError::InvalidInput(format!(
            "trial ID exceeds maximum length of {} characters",
            MAX_TRIAL_ID_LEN
        )));
    }

    if !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(TrialsError::InvalidInput(
            "trial ID contains invalid characters (only ASCII letters and digits allowed)".into(),
        ));
    }

    Ok(())
}

/// Validates a latitude/longitude pair.
///
/// # Errors
///
/// Returns a `TrialsError::InvalidInput` if either value is not finite or out of range.
pub fn validate_coordinates(lat: f64, lng: f64) -> TrialsResult<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(TrialsError::InvalidInput(
            "latitude must be between -90 and 90".into(),
        ));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(TrialsError::InvalidInput(
            "longitude must be between -180 and 180".into(),
        ));
    }
    Ok(())
}

/// Deserializes an optional query-string number, treating blank or unparsable values as absent.
///
/// Use with `#[serde(default, deserialize_with = "lenient_number")]` so that `page=abc` falls
/// back to the default page instead of rejecting the whole request.
///
/// # Errors
///
/// Only fails when the value is not a string at all.
pub fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}
