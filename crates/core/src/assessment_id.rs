//! Identifiers for stored assessments.

use crate::{TrialsError, TrialsResult};
use std::fmt;
use uuid::Uuid;

/// Canonical assessment identifier (32 lowercase hex characters, no hyphens).
///
/// # Construction
/// - [`AssessmentId::new`] generates a fresh random identifier for a new assessment.
/// - [`AssessmentId::parse`] validates an identifier supplied by a client.
///
/// # Display format
/// Always the canonical 32-character lowercase hex form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AssessmentId(Uuid);

impl Default for AssessmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentId {
    /// Generates a new random (version 4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> TrialsResult<Self> {
        let invalid = || {
            TrialsError::InvalidInput(format!(
                "assessment ID must be 32 lowercase hex characters without hyphens, got: '{input}'"
            ))
        };
        if !Self::is_canonical(input) {
            return Err(invalid());
        }
        Uuid::parse_str(input).map(Self).map_err(|_| invalid())
    }

    /// Returns true if `input` is exactly 32 characters of `0-9` or `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32 && input.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl serde::Serialize for AssessmentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
