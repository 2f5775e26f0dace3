//! Questionnaire answers submitted for an eligibility assessment.
//!
//! Answers are an open map from field name to text or a list of texts. Nothing beyond the
//! presence of the required fields is validated; the scoring rules read whatever they recognise
//! through [`AnswerField`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single answer: free text (numbers and booleans are held as text) or a multi-select list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// True when the answer carries any non-blank content.
    pub fn is_present(&self) -> bool {
        !self.items().is_empty()
    }

    /// Non-blank trimmed items; a text answer yields at most one.
    pub fn items(&self) -> Vec<&str> {
        match self {
            Self::Text(text) => Some(text.trim()).filter(|t| !t.is_empty()).into_iter().collect(),
            Self::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect(),
        }
    }

    /// The first non-blank item.
    pub fn first(&self) -> Option<&str> {
        self.items().into_iter().next()
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_owned).collect())
    }
}

impl<'de> Deserialize<'de> for AnswerValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Self::List(items.into_iter().map(scalar_text).collect()),
            other => Self::Text(scalar_text(other)),
        })
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Questionnaire fields the scoring engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerField {
    Age,
    CancerType,
    Stage,
    PerformanceStatus,
    OrganFunction,
    PreviousTreatment,
    GeneticMutations,
    Location,
    HealthConditions,
    TravelWillingness,
    TreatmentPreferences,
    TrialPhasePreferences,
    SpecialConsiderations,
    GeneticTesting,
    OrganFunctionOverall,
}

impl AnswerField {
    pub const ALL: [AnswerField; 15] = [
        Self::Age,
        Self::CancerType,
        Self::Stage,
        Self::PerformanceStatus,
        Self::OrganFunction,
        Self::PreviousTreatment,
        Self::GeneticMutations,
        Self::Location,
        Self::HealthConditions,
        Self::TravelWillingness,
        Self::TreatmentPreferences,
        Self::TrialPhasePreferences,
        Self::SpecialConsiderations,
        Self::GeneticTesting,
        Self::OrganFunctionOverall,
    ];

    /// Fields every assessment must answer.
    pub const REQUIRED: [AnswerField; 5] = [
        Self::Age,
        Self::CancerType,
        Self::Stage,
        Self::PerformanceStatus,
        Self::OrganFunction,
    ];

    /// Canonical (camelCase) key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::CancerType => "cancerType",
            Self::Stage => "stage",
            Self::PerformanceStatus => "performanceStatus",
            Self::OrganFunction => "organFunction",
            Self::PreviousTreatment => "previousTreatment",
            Self::GeneticMutations => "geneticMutations",
            Self::Location => "location",
            Self::HealthConditions => "healthConditions",
            Self::TravelWillingness => "travelWillingness",
            Self::TreatmentPreferences => "treatmentPreferences",
            Self::TrialPhasePreferences => "trialPhasePreferences",
            Self::SpecialConsiderations => "specialConsiderations",
            Self::GeneticTesting => "geneticTesting",
            Self::OrganFunctionOverall => "organFunctionOverall",
        }
    }

    /// Kebab-case keys accepted from older clients.
    pub fn alias(self) -> Option<&'static str> {
        match self {
            Self::TreatmentPreferences => Some("treatment-preferences"),
            Self::TrialPhasePreferences => Some("trial-phase-preferences"),
            Self::SpecialConsiderations => Some("special-considerations"),
            Self::GeneticTesting => Some("genetic-testing"),
            Self::OrganFunctionOverall => Some("organ-function-overall"),
            _ => None,
        }
    }

    /// Resolves a canonical key or alias.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key || field.alias() == Some(key))
    }
}

/// The full answer map for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, AnswerValue>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no keys were submitted at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AnswerValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// The present answer for `field`, looking at the canonical key first and then the alias.
    pub fn get(&self, field: AnswerField) -> Option<&AnswerValue> {
        std::iter::once(field.key())
            .chain(field.alias())
            .filter_map(|key| self.0.get(key))
            .find(|value| value.is_present())
    }

    /// First non-blank item of the answer for `field`.
    pub fn text(&self, field: AnswerField) -> Option<&str> {
        self.get(field).and_then(AnswerValue::first)
    }

    /// All non-blank items of the answer for `field`.
    pub fn items(&self, field: AnswerField) -> Vec<&str> {
        self.get(field).map(AnswerValue::items).unwrap_or_default()
    }

    /// Leading integer of the age answer, read the way a lenient form parser would.
    pub fn age(&self) -> Option<u32> {
        let text = self.text(AnswerField::Age)?;
        let digits: String = text.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    /// Canonical keys of required fields that are absent or blank.
    pub fn missing_required(&self) -> Vec<String> {
        AnswerField::REQUIRED
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .map(|field| field.key().to_owned())
            .collect()
    }
}

impl<K: Into<String>, V: Into<AnswerValue>> FromIterator<(K, V)> for Answers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut answers = Self::new();
        for (key, value) in iter {
            answers.insert(key, value);
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numbers_bools_nulls_and_lists() {
        let answers: Answers = serde_json::from_value(json!({
            "age": 45,
            "cancerType": "Lung Cancer",
            "stage": null,
            "consent": true,
            "treatmentPreferences": ["Surgery", " ", "Immunotherapy"]
        }))
        .unwrap();

        assert_eq!(answers.age(), Some(45));
        assert_eq!(answers.text(AnswerField::CancerType), Some("Lung Cancer"));
        assert!(answers.get(AnswerField::Stage).is_none());
        assert_eq!(
            answers.items(AnswerField::TreatmentPreferences),
            vec!["Surgery", "Immunotherapy"]
        );
    }

    #[test]
    fn aliases_resolve_to_canonical_fields() {
        let answers: Answers = serde_json::from_value(json!({
            "trial-phase-preferences": "Phase 2 (Effectiveness testing)",
            "genetic-testing": "No"
        }))
        .unwrap();

        assert_eq!(answers.text(AnswerField::GeneticTesting), Some("No"));
        assert_eq!(
            answers.items(AnswerField::TrialPhasePreferences),
            vec!["Phase 2 (Effectiveness testing)"]
        );
        assert_eq!(
            AnswerField::from_key("organ-function-overall"),
            Some(AnswerField::OrganFunctionOverall)
        );
    }

    #[test]
    fn missing_required_lists_blank_and_absent_fields() {
        let answers: Answers = [("age", "30"), ("cancerType", "  "), ("stage", "Stage II")]
            .into_iter()
            .collect();
        assert_eq!(
            answers.missing_required(),
            vec!["cancerType", "performanceStatus", "organFunction"]
        );
    }

    #[test]
    fn age_reads_leading_digits_only() {
        let answers: Answers = [("age", "62 years")].into_iter().collect();
        assert_eq!(answers.age(), Some(62));
        let answers: Answers = [("age", "unknown")].into_iter().collect();
        assert_eq!(answers.age(), None);
    }
}
