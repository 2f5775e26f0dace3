//! # Trial Types
//!
//! Small shared types used across the workspace:
//! - [`NonEmptyText`], a trimmed string that is guaranteed to carry content
//! - [`Trial`], the flattened projection of an upstream registry study
//! - [`FilterOptions`], the distinct filter values offered to the search UI
//!
//! No I/O and no business rules live here; the registry adapter produces these types and the
//! core crate consumes them.

mod trial;

pub use trial::{CentralContact, Coordinates, FilterOptions, Trial};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Builds a filter value from optional user input.
    ///
    /// Search filters use `"all"` (any case) as a sentinel for "no filter", so both the
    /// sentinel and blank input map to `None`.
    pub fn filter_value(input: Option<&str>) -> Option<Self> {
        let text = Self::new(input?).ok()?;
        if text.0.eq_ignore_ascii_case("all") {
            return None;
        }
        Some(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the lower-cased content, which is how most text matching compares values.
    pub fn to_lowercase(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank_input() {
        assert_eq!(NonEmptyText::new("  lung ").unwrap().as_str(), "lung");
        assert!(matches!(NonEmptyText::new("   "), Err(TextError::Empty)));
    }

    #[test]
    fn filter_value_treats_all_as_unset() {
        assert!(NonEmptyText::filter_value(None).is_none());
        assert!(NonEmptyText::filter_value(Some("")).is_none());
        assert!(NonEmptyText::filter_value(Some("ALL")).is_none());
        assert_eq!(
            NonEmptyText::filter_value(Some(" Phase 2 ")).unwrap().as_str(),
            "Phase 2"
        );
    }

    #[test]
    fn deserialize_rejects_whitespace() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
