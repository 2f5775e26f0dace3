//! Eligibility scoring engine.
//!
//! A trial is scored against a patient's answers by evaluating one rule per [`Factor`]. Each rule
//! either abstains (its answer is absent, so its weight leaves the denominator) or awards
//! between zero and the factor's maximum points. The percentage is
//! `round(100 * raw / total)` over the factors that took part, and is then bucketed into a
//! [`MatchLevel`].
//!
//! All matching is case-insensitive substring search over the trial's free text, except the
//! exact tier of the cancer-type rule which requires the answer verbatim.

mod rules;
mod synonyms;

pub(crate) use rules::{
    compact_phase, phase_preference_matches, travel_points, treatment_preference_matches,
    TreatmentHistory,
};

use serde::{Serialize, Serializer};
use trial_types::Trial;
use utoipa::ToSchema;

use crate::answers::Answers;

/// Categorical label for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum MatchLevel {
    #[serde(rename = "Excellent Match")]
    Excellent,
    #[serde(rename = "Very Good Match")]
    VeryGood,
    #[serde(rename = "Good Match")]
    Good,
    #[serde(rename = "Fair Match")]
    Fair,
    #[serde(rename = "Partial Match")]
    Partial,
    #[serde(rename = "Poor Match")]
    Poor,
}

impl MatchLevel {
    /// Maps a 0-100 score using inclusive lower bounds 90/80/70/60/40.
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            80..=89 => Self::VeryGood,
            70..=79 => Self::Good,
            60..=69 => Self::Fair,
            40..=59 => Self::Partial,
            _ => Self::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent Match",
            Self::VeryGood => "Very Good Match",
            Self::Good => "Good Match",
            Self::Fair => "Fair Match",
            Self::Partial => "Partial Match",
            Self::Poor => "Poor Match",
        }
    }
}

impl std::fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse importance band shown next to each factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Weight {
    High,
    Medium,
    Low,
}

/// One scored dimension of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    CancerType,
    Stage,
    Age,
    TreatmentHistory,
    HealthStatus,
    TravelWillingness,
    TreatmentPreferences,
    TrialPhasePreferences,
    SpecialConsiderations,
    GeneticTesting,
    OrganFunction,
}

impl Factor {
    /// Evaluation order, which is also the order of the match details.
    pub const ALL: [Factor; 11] = [
        Self::CancerType,
        Self::Stage,
        Self::Age,
        Self::TreatmentHistory,
        Self::HealthStatus,
        Self::TravelWillingness,
        Self::TreatmentPreferences,
        Self::TrialPhasePreferences,
        Self::SpecialConsiderations,
        Self::GeneticTesting,
        Self::OrganFunction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CancerType => "Cancer Type",
            Self::Stage => "Cancer Stage",
            Self::Age => "Age",
            Self::TreatmentHistory => "Treatment History",
            Self::HealthStatus => "Health Status",
            Self::TravelWillingness => "Travel Willingness",
            Self::TreatmentPreferences => "Treatment Preferences",
            Self::TrialPhasePreferences => "Trial Phase Preferences",
            Self::SpecialConsiderations => "Special Considerations",
            Self::GeneticTesting => "Genetic Testing",
            Self::OrganFunction => "Overall Organ Function",
        }
    }

    pub fn max_points(self) -> u32 {
        match self {
            Self::CancerType => 40,
            Self::Stage => 25,
            Self::Age | Self::TreatmentHistory => 20,
            Self::HealthStatus | Self::TreatmentPreferences => 15,
            Self::TrialPhasePreferences => 12,
            Self::TravelWillingness | Self::SpecialConsiderations => 10,
            Self::GeneticTesting => 8,
            Self::OrganFunction => 5,
        }
    }

    pub fn weight(self) -> Weight {
        match self {
            Self::CancerType | Self::Stage => Weight::High,
            Self::TravelWillingness | Self::GeneticTesting | Self::OrganFunction => Weight::Low,
            _ => Weight::Medium,
        }
    }
}

impl Serialize for Factor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Result of one factor for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FactorOutcome {
    #[schema(value_type = String, example = "Cancer Type")]
    pub factor: Factor,
    #[serde(rename = "match")]
    pub matched: bool,
    pub weight: Weight,
    pub points: u32,
    pub max_points: u32,
    pub description: String,
}

/// Full score of one trial against one answer set.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityScore {
    pub score: u8,
    pub raw_score: u32,
    pub total_points: u32,
    pub match_details: Vec<FactorOutcome>,
    pub match_level: MatchLevel,
}

impl EligibilityScore {
    /// Outcome of `factor`, if it took part.
    pub fn outcome(&self, factor: Factor) -> Option<&FactorOutcome> {
        self.match_details.iter().find(|d| d.factor == factor)
    }

    /// True when `factor` took part and matched.
    pub fn matched(&self, factor: Factor) -> bool {
        self.outcome(factor).is_some_and(|d| d.matched)
    }
}

/// Lower-cased views of the trial text the rules search.
pub(crate) struct TrialText<'a> {
    pub condition: &'a str,
    pub title: &'a str,
    pub phase: &'a str,
    pub condition_lc: String,
    pub title_lc: String,
    pub description_lc: String,
    pub eligibility_lc: String,
    pub treatment_lc: String,
}

impl<'a> TrialText<'a> {
    pub fn new(trial: &'a Trial) -> Self {
        Self {
            condition: &trial.condition,
            title: &trial.title,
            phase: &trial.phase,
            condition_lc: trial.condition.to_lowercase(),
            title_lc: trial.title.to_lowercase(),
            description_lc: trial.description.to_lowercase(),
            eligibility_lc: trial.eligibility.to_lowercase(),
            treatment_lc: trial.treatment_type.to_lowercase(),
        }
    }
}

/// Score `trial` against `answers`.
pub fn score_trial(trial: &Trial, answers: &Answers) -> EligibilityScore {
    let text = TrialText::new(trial);
    let match_details: Vec<FactorOutcome> = Factor::ALL
        .into_iter()
        .filter_map(|factor| rules::evaluate(factor, &text, answers))
        .collect();

    let raw_score: u32 = match_details.iter().map(|d| d.points).sum();
    let total_points: u32 = match_details.iter().map(|d| d.max_points).sum();
    let score = percentage(raw_score, total_points);

    tracing::debug!(
        trial = %trial.id,
        score,
        raw_score,
        total_points,
        "scored trial"
    );

    EligibilityScore {
        score,
        raw_score,
        total_points,
        match_details,
        match_level: MatchLevel::from_score(score),
    }
}

/// `round(100 * raw / total)`, clamped to 0..=100; zero when nothing was answered.
pub fn percentage(raw: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (f64::from(raw) * 100.0 / f64::from(total)).round();
    pct.clamp(0.0, 100.0) as u8
}
