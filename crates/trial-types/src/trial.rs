use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A geographic point for the first listed trial site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// The registry's central contact for a study, when one is published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CentralContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Flattened projection of one upstream study record.
///
/// Every text field is populated (the adapter substitutes placeholders such as
/// `"Not specified"`), so matching code can treat them as plain strings. Only the first site is
/// represented in `location`, `zip_code` and `coordinates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Trial {
    pub id: String,
    pub title: String,
    pub phase: String,
    pub condition: String,
    pub location: String,
    pub status: String,
    pub participants: String,
    pub description: String,
    pub eligibility: String,
    pub sponsor: String,
    pub treatment_type: String,
    pub trial_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub eligibility_criteria: Vec<String>,
    pub start_date: String,
    pub completion_date: String,
    pub study_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub central_contact: Option<CentralContact>,
}

impl Trial {
    /// Number of enrolled (or anticipated) participants parsed from the `participants` text.
    ///
    /// The field looks like `"120 (estimated)"`; the first run of digits is used and `0` is
    /// returned when there is none.
    pub fn participant_count(&self) -> u64 {
        self.participants
            .split(|c: char| !c.is_ascii_digit())
            .find(|run| !run.is_empty())
            .and_then(|run| run.parse().ok())
            .unwrap_or(0)
    }
}

/// Distinct values offered to the search UI as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub cancer_types: Vec<String>,
    pub phases: Vec<String>,
    pub locations: Vec<String>,
    pub statuses: Vec<String>,
    pub treatment_types: Vec<String>,
}
