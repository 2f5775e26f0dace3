//! Search-box autocomplete.
//!
//! Suggestions come from fixed vocabularies (cancer types, cities, institution kinds, treatment
//! modalities) and, for the `all` type, from titles and conditions of trials the registry returns
//! for the query.

use crate::constants::{SUGGESTION_LIMIT, SUGGESTION_MIN_QUERY_CHARS};
use serde::{Deserialize, Serialize};
use trial_types::Trial;
use utoipa::{IntoParams, ToSchema};

const CANCER_TYPES: &[&str] = &[
    "Breast Cancer",
    "Lung Cancer",
    "Colorectal Cancer",
    "Lymphoma",
    "Leukemia",
    "Prostate Cancer",
    "Pancreatic Cancer",
    "Ovarian Cancer",
    "Melanoma",
    "Brain Cancer",
];

const LOCATIONS: &[&str] = &[
    "New York",
    "Houston",
    "Baltimore",
    "Rochester",
    "Los Angeles",
    "Boston",
    "Chicago",
    "Philadelphia",
    "Seattle",
    "Atlanta",
    "Miami",
    "Denver",
    "Cleveland",
    "Pittsburgh",
    "Nashville",
];

const INSTITUTION_TYPES: &[&str] = &[
    "University",
    "Medical Center",
    "Cancer Center",
    "Institute",
    "Clinic",
    "Pharmaceutical",
    "Government",
    "Nonprofit",
    "Foundation",
];

const TREATMENTS: &[&str] = &[
    "Immunotherapy",
    "Targeted Therapy",
    "Chemotherapy",
    "Radiation Therapy",
    "Surgery",
    "Hormone Therapy",
    "Vaccine",
    "Stem Cell Therapy",
];

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestionQuery {
    /// Text typed so far; at least two characters.
    pub q: Option<String>,
    /// `all` (default), `cancer`, `location`, `sponsor` or `treatment`.
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub kind: Option<String>,
}

/// Which vocabularies a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionScope {
    All,
    Cancer,
    Location,
    Sponsor,
    Treatment,
    /// An unrecognised type: nothing is suggested.
    None,
}

impl SuggestionScope {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "all" => Self::All,
            "cancer" => Self::Cancer,
            "location" => Self::Location,
            "sponsor" => Self::Sponsor,
            "treatment" => Self::Treatment,
            _ => Self::None,
        }
    }

    fn includes(self, other: Self) -> bool {
        self == Self::All || self == other
    }

    /// True when registry trials should be consulted.
    pub fn wants_trials(self) -> bool {
        self == Self::All
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub display: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_id: Option<String>,
}

impl Suggestion {
    fn new(kind: &str, value: &str, category: &str) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            display: value.into(),
            category: category.into(),
            trial_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub suggestions: Vec<Suggestion>,
    pub total: usize,
}

/// True when `query` is long enough to produce suggestions.
pub fn is_suggestible(query: &str) -> bool {
    query.chars().count() >= SUGGESTION_MIN_QUERY_CHARS
}

/// Builds the suggestion list for `query` under `kind`, drawing dynamic entries from `trials`.
pub fn suggest(query: &str, kind: &str, trials: &[Trial]) -> SuggestionResponse {
    let mut suggestions = Vec::new();

    if is_suggestible(query) {
        let query_lc = query.to_lowercase();
        let scope = SuggestionScope::parse(kind);
        let vocabularies = [
            (SuggestionScope::Cancer, CANCER_TYPES, "cancer", "Cancer Type"),
            (SuggestionScope::Location, LOCATIONS, "location", "Location"),
            (SuggestionScope::Sponsor, INSTITUTION_TYPES, "sponsor", "Institution Type"),
            (SuggestionScope::Treatment, TREATMENTS, "treatment", "Treatment Type"),
        ];
        for (vocab_scope, words, kind, category) in vocabularies {
            if scope.includes(vocab_scope) {
                suggestions.extend(
                    words
                        .iter()
                        .filter(|w| w.to_lowercase().contains(&query_lc))
                        .map(|w| Suggestion::new(kind, w, category)),
                );
            }
        }

        if scope.wants_trials() {
            for trial in trials {
                push_dynamic(&mut suggestions, &query_lc, &trial.title, || Suggestion {
                    trial_id: Some(trial.id.clone()),
                    ..Suggestion::new("trial", &trial.title, "Trial Title")
                });
                push_dynamic(&mut suggestions, &query_lc, &trial.condition, || {
                    Suggestion::new("condition", &trial.condition, "Medical Condition")
                });
            }
        }

        suggestions.sort_by_cached_key(|s| {
            let value = s.value.to_lowercase();
            (
                value != query_lc,
                !value.starts_with(&query_lc),
                value.find(&query_lc).unwrap_or(usize::MAX),
            )
        });
    }

    let total = suggestions.len();
    suggestions.truncate(SUGGESTION_LIMIT);
    SuggestionResponse {
        query: query.into(),
        kind: kind.into(),
        suggestions,
        total,
    }
}

fn push_dynamic(
    suggestions: &mut Vec<Suggestion>,
    query_lc: &str,
    value: &str,
    build: impl FnOnce() -> Suggestion,
) {
    if value.to_lowercase().contains(query_lc) && !suggestions.iter().any(|s| s.value == value) {
        suggestions.push(build());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_yield_nothing() {
        let res = suggest("l", "all", &[]);
        assert!(res.suggestions.is_empty());
        assert_eq!(res.total, 0);
    }

    #[test]
    fn exact_then_prefix_then_position() {
        let res = suggest("lymphoma", "all", &[]);
        assert_eq!(res.suggestions[0].value, "Lymphoma");

        let res = suggest("ca", "all", &[]);
        let values: Vec<_> = res.suggestions.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values[0], "Cancer Center");
        assert!(values.contains(&"Breast Cancer"));
        assert!(res.total >= res.suggestions.len());
    }

    #[test]
    fn type_restricts_vocabulary() {
        let res = suggest("the", "treatment", &[]);
        assert!(res.suggestions.iter().all(|s| s.kind == "treatment"));
        assert!(res.suggestions.iter().any(|s| s.value == "Immunotherapy"));

        assert!(suggest("bo", "nonsense", &[]).suggestions.is_empty());
    }

    #[test]
    fn trials_contribute_unique_titles_and_conditions() {
        let trials = vec![
            Trial {
                id: "NCT1".into(),
                title: "Melanoma Vaccine Study".into(),
                condition: "Melanoma".into(),
                ..Trial::default()
            },
            Trial {
                id: "NCT2".into(),
                title: "Melanoma Vaccine Study".into(),
                condition: "Uveal Melanoma".into(),
                ..Trial::default()
            },
        ];
        let res = suggest("melanoma", "all", &trials);
        let values: Vec<_> = res.suggestions.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["Melanoma", "Melanoma Vaccine Study", "Uveal Melanoma"]
        );
        assert_eq!(res.suggestions[1].trial_id.as_deref(), Some("NCT1"));

        let res = suggest("melanoma", "cancer", &trials);
        assert_eq!(res.total, 1);
    }

    #[test]
    fn results_are_capped_but_total_is_not() {
        let trials: Vec<_> = (0..20)
            .map(|i| Trial {
                id: format!("NCT{i}"),
                title: format!("Study of Lung Cancer cohort {i}"),
                ..Trial::default()
            })
            .collect();
        let res = suggest("lung", "all", &trials);
        assert_eq!(res.suggestions.len(), SUGGESTION_LIMIT);
        assert_eq!(res.total, 21);
        assert_eq!(res.suggestions[0].value, "Lung Cancer");
    }
}
