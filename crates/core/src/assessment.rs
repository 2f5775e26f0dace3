//! Eligibility assessments.
//!
//! An assessment scores and ranks a candidate set of trials against one answer map, then derives
//! a summary, the recommended trials, narrative insights and suggested next steps. The resulting
//! [`AssessmentRecord`] is what the assessment store keeps.

use crate::answers::{AnswerField, Answers};
use crate::assessment_id::AssessmentId;
use crate::constants::{OTHER_TRIAL_LIMIT, TOP_MATCH_LIMIT, TOP_MATCH_MIN_SCORE};
use crate::ranking::{rank, ScoredTrial};
use crate::scoring::{travel_points, Factor, MatchLevel, TreatmentHistory};
use crate::{TrialsError, TrialsResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use trial_types::Trial;
use utoipa::ToSchema;

/// Counts per match level plus score statistics over every ranked trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSummary {
    pub total_trials: usize,
    pub excellent_matches: usize,
    pub very_good_matches: usize,
    pub good_matches: usize,
    pub fair_matches: usize,
    pub partial_matches: usize,
    pub poor_matches: usize,
    pub average_score: u8,
    pub best_score: u8,
    pub worst_score: u8,
}

impl AssessmentSummary {
    fn from_ranked(ranked: &[ScoredTrial]) -> Self {
        let count = |level: MatchLevel| ranked.iter().filter(|t| t.match_level == level).count();
        let scores = || ranked.iter().map(|t| t.eligibility_score);
        let average_score = if ranked.is_empty() {
            0
        } else {
            let sum: u32 = scores().map(u32::from).sum();
            (f64::from(sum) / ranked.len() as f64).round() as u8
        };

        Self {
            total_trials: ranked.len(),
            excellent_matches: count(MatchLevel::Excellent),
            very_good_matches: count(MatchLevel::VeryGood),
            good_matches: count(MatchLevel::Good),
            fair_matches: count(MatchLevel::Fair),
            partial_matches: count(MatchLevel::Partial),
            poor_matches: count(MatchLevel::Poor),
            average_score,
            best_score: scores().max().unwrap_or(0),
            worst_score: scores().min().unwrap_or(0),
        }
    }
}

/// The trials put in front of the patient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub top_matches: Vec<ScoredTrial>,
    pub other_trials: Vec<ScoredTrial>,
    pub total_recommendations: usize,
}

impl Recommendations {
    fn from_ranked(ranked: &[ScoredTrial]) -> Self {
        let top_matches: Vec<_> = ranked
            .iter()
            .filter(|t| t.eligibility_score >= TOP_MATCH_MIN_SCORE)
            .take(TOP_MATCH_LIMIT)
            .cloned()
            .collect();
        let other_trials: Vec<_> = ranked
            .iter()
            .filter(|t| t.eligibility_score < TOP_MATCH_MIN_SCORE)
            .take(OTHER_TRIAL_LIMIT)
            .cloned()
            .collect();
        Self {
            total_recommendations: top_matches.len() + other_trials.len(),
            top_matches,
            other_trials,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Positive,
    Warning,
    Info,
}

/// Short reference to a trial inside an insight.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrialRef {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl TrialRef {
    fn of(trial: &Trial) -> Self {
        Self {
            id: trial.id.clone(),
            title: trial.title.clone(),
            location: None,
        }
    }

    fn with_location(trial: &Trial) -> Self {
        Self {
            location: Some(trial.location.clone()),
            ..Self::of(trial)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trials: Vec<TrialRef>,
}

impl Insight {
    fn new(kind: InsightKind, category: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            category: category.into(),
            message: message.into(),
            suggestion: None,
            trials: Vec::new(),
        }
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn with_trials(mut self, trials: Vec<TrialRef>) -> Self {
        self.trials = trials;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NextStep {
    pub priority: Priority,
    pub action: String,
    pub description: String,
    pub details: String,
}

impl NextStep {
    fn new(priority: Priority, action: &str, description: impl Into<String>, details: &str) -> Self {
        Self {
            priority,
            action: action.into(),
            description: description.into(),
            details: details.into(),
        }
    }
}

/// A completed assessment as returned to the client and kept in the store.
///
/// `ranked` holds every scored candidate so enhanced insights can be computed later; it is not
/// part of the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    #[schema(value_type = String, example = "0f8c2d1e6b3a4f5e9d7c8b6a5f4e3d2c")]
    pub id: AssessmentId,
    pub timestamp: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub answers: Answers,
    pub summary: AssessmentSummary,
    pub recommendations: Recommendations,
    pub insights: Vec<Insight>,
    pub next_steps: Vec<NextStep>,
    #[serde(skip)]
    pub ranked: Vec<ScoredTrial>,
}

/// Rejects an empty answer map or one missing any required field.
///
/// # Errors
///
/// Returns [`TrialsError::MissingAnswers`] when nothing was submitted, or
/// [`TrialsError::MissingFields`] listing the required fields that are absent or blank.
pub fn validate_answers(answers: &Answers) -> TrialsResult<()> {
    if answers.is_empty() {
        return Err(TrialsError::MissingAnswers);
    }
    let missing = answers.missing_required();
    if !missing.is_empty() {
        return Err(TrialsError::MissingFields(missing));
    }
    Ok(())
}

/// Scores, ranks and summarises `candidates` against `answers`.
///
/// # Errors
///
/// Returns the errors of [`validate_answers`].
pub fn assess(answers: Answers, candidates: Vec<Trial>) -> TrialsResult<AssessmentRecord> {
    validate_answers(&answers)?;

    let ranked = rank(candidates, &answers);
    let recommendations = Recommendations::from_ranked(&ranked);
    let record = AssessmentRecord {
        id: AssessmentId::new(),
        timestamp: Utc::now(),
        summary: AssessmentSummary::from_ranked(&ranked),
        insights: insights(&answers, &ranked),
        next_steps: next_steps(&recommendations.top_matches),
        recommendations,
        answers,
        ranked,
    };

    tracing::info!(
        assessment = %record.id,
        trials = record.summary.total_trials,
        best = record.summary.best_score,
        top_matches = record.recommendations.top_matches.len(),
        "assessment completed"
    );
    Ok(record)
}

fn refs_where(
    ranked: &[ScoredTrial],
    limit: usize,
    keep: impl Fn(&ScoredTrial) -> bool,
) -> Vec<TrialRef> {
    ranked
        .iter()
        .filter(|t| keep(t))
        .take(limit)
        .map(|t| TrialRef::of(&t.trial))
        .collect()
}

fn eligibility_mentions(trial: &ScoredTrial, needle: &str) -> bool {
    trial.trial.eligibility.to_lowercase().contains(needle)
}

fn insights(answers: &Answers, ranked: &[ScoredTrial]) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some(cancer_type) = answers
        .text(AnswerField::CancerType)
        .filter(|ct| !ct.eq_ignore_ascii_case("other"))
    {
        let matching = refs_where(ranked, usize::MAX, |t| t.matched(Factor::CancerType));
        insights.push(if matching.is_empty() {
            Insight::new(
                InsightKind::Warning,
                "Cancer Type",
                format!(
                    "Limited trials available for {cancer_type}. Consider expanding your search criteria."
                ),
            )
            .suggest("Look for trials with related cancer types or broader eligibility criteria")
        } else {
            Insight::new(
                InsightKind::Positive,
                "Cancer Type",
                format!(
                    "Found {} trials specifically for {cancer_type}",
                    matching.len()
                ),
            )
            .with_trials(matching.into_iter().take(3).collect())
        });
    }

    match answers.age().filter(|age| *age > 0) {
        Some(age) if age < 18 => insights.push(
            Insight::new(
                InsightKind::Info,
                "Age",
                "You qualify for pediatric trials. These often have specialized care and monitoring.",
            )
            .with_trials(refs_where(ranked, 2, |t| eligibility_mentions(t, "pediatric"))),
        ),
        Some(age) if age >= 65 => insights.push(
            Insight::new(
                InsightKind::Info,
                "Age",
                "You qualify for elderly-specific trials. These consider age-related health factors.",
            )
            .with_trials(refs_where(ranked, 2, |t| eligibility_mentions(t, "elderly"))),
        ),
        _ => {}
    }

    if let Some(history) = answers.text(AnswerField::PreviousTreatment) {
        let therapy = match TreatmentHistory::classify(history) {
            TreatmentHistory::Naive => {
                insights.push(
                    Insight::new(
                        InsightKind::Positive,
                        "Treatment History",
                        "Being treatment-naive gives you access to more trial options, including first-line treatments.",
                    )
                    .with_trials(refs_where(ranked, 2, |t| eligibility_mentions(t, "no previous"))),
                );
                None
            }
            TreatmentHistory::Chemotherapy => Some("chemotherapy"),
            TreatmentHistory::Immunotherapy => Some("immunotherapy"),
            TreatmentHistory::Other => None,
        };
        if let Some(therapy) = therapy {
            insights.push(
                Insight::new(
                    InsightKind::Info,
                    "Treatment History",
                    format!(
                        "Previous {therapy} experience may qualify you for trials testing new combinations or second-line treatments."
                    ),
                )
                .with_trials(refs_where(ranked, 2, |t| eligibility_mentions(t, "previous"))),
            );
        }
    }

    if let Some(travel) = answers.text(AnswerField::TravelWillingness) {
        match travel_points(travel) {
            10 => insights.push(
                Insight::new(
                    InsightKind::Positive,
                    "Location",
                    "Your willingness to travel widely significantly increases your trial options.",
                )
                .with_trials(
                    ranked
                        .iter()
                        .take(3)
                        .map(|t| TrialRef::with_location(&t.trial))
                        .collect(),
                ),
            ),
            8 => {}
            _ => insights.push(
                Insight::new(
                    InsightKind::Warning,
                    "Location",
                    "Limited travel may restrict your trial options. Consider expanding your travel radius.",
                )
                .suggest("Look for trials in nearby major cities or academic medical centers"),
            ),
        }
    }

    let excellent = ranked
        .iter()
        .filter(|t| t.match_level == MatchLevel::Excellent)
        .count();
    if excellent >= 3 {
        insights.push(
            Insight::new(
                InsightKind::Positive,
                "Overall Match",
                format!("Excellent! You have {excellent} high-quality trial matches."),
            )
            .suggest("Focus on trials with the highest scores and best phase/status combinations"),
        );
    } else if excellent == 0 {
        insights.push(
            Insight::new(
                InsightKind::Warning,
                "Overall Match",
                "No excellent matches found. Consider adjusting your criteria or expanding your search.",
            )
            .suggest("Look for trials with \"Good Match\" or \"Fair Match\" ratings that may still be suitable"),
        );
    }

    insights
}

fn next_steps(top_matches: &[ScoredTrial]) -> Vec<NextStep> {
    let mut steps = Vec::new();

    if top_matches.is_empty() {
        steps.push(NextStep::new(
            Priority::High,
            "Expand Search Criteria",
            "Consider broadening your eligibility criteria or travel radius",
            "Look for trials with different cancer types, phases, or locations",
        ));
    } else {
        steps.push(NextStep::new(
            Priority::High,
            "Contact Top Trial Sites",
            format!(
                "Reach out to the top {} trial sites",
                top_matches.len().min(3)
            ),
            "Call or email the trial coordinators to discuss your eligibility and next steps",
        ));
        if top_matches.iter().any(|t| t.phase_priority == 100) {
            steps.push(NextStep::new(
                Priority::Medium,
                "Research Phase 1 Trials",
                "Learn about the risks and benefits of early-phase trials",
                "Phase 1 trials test safety and dosage, not effectiveness",
            ));
        }
        if top_matches.iter().any(|t| t.status_priority == 100) {
            steps.push(NextStep::new(
                Priority::Medium,
                "Prepare for Screening",
                "Gather medical records and prepare for initial screening",
                "Most trials require recent medical history, lab results, and imaging studies",
            ));
        }
    }

    steps.push(NextStep::new(
        Priority::Low,
        "Consult Your Doctor",
        "Discuss trial options with your oncologist",
        "Your doctor can help evaluate trial suitability and coordinate with trial sites",
    ));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Answers {
        [
            ("age", "45"),
            ("cancerType", "Breast Cancer"),
            ("stage", "Advanced"),
            ("performanceStatus", "ECOG 1 (Restricted in strenuous activity)"),
            ("organFunction", "Adequate"),
        ]
        .into_iter()
        .collect()
    }

    fn trial(id: &str, condition: &str, phase: &str, status: &str) -> Trial {
        Trial {
            id: id.into(),
            title: format!("{condition} Study"),
            condition: condition.into(),
            phase: phase.into(),
            status: status.into(),
            description: "advanced disease".into(),
            eligibility: "Adults 18 to 75 years, good performance status, adequate organ function"
                .into(),
            ..Trial::default()
        }
    }

    #[test]
    fn empty_and_incomplete_answers_are_rejected() {
        assert!(matches!(
            validate_answers(&Answers::new()),
            Err(TrialsError::MissingAnswers)
        ));

        let partial: Answers = [("age", "45"), ("cancerType", "Lung Cancer")]
            .into_iter()
            .collect();
        match validate_answers(&partial) {
            Err(TrialsError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["stage", "performanceStatus", "organFunction"])
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn summary_and_recommendations_split_on_score() {
        let unrelated = Trial {
            id: "NCT2".into(),
            condition: "Healthy Volunteers".into(),
            phase: "PHASE3".into(),
            ..Trial::default()
        };
        let record = assess(
            required(),
            vec![
                trial("NCT1", "Breast Cancer", "PHASE1", "RECRUITING"),
                unrelated,
                trial("NCT3", "Breast Cancer", "PHASE2", "COMPLETED"),
            ],
        )
        .unwrap();

        assert_eq!(record.summary.total_trials, 3);
        assert_eq!(record.summary.best_score, 100);
        assert!(record.summary.worst_score < TOP_MATCH_MIN_SCORE);
        assert_eq!(record.recommendations.top_matches.len(), 2);
        assert_eq!(record.recommendations.other_trials.len(), 1);
        assert_eq!(record.recommendations.total_recommendations, 3);
        assert_eq!(record.recommendations.top_matches[0].trial.id, "NCT1");
        assert_eq!(record.ranked.len(), 3);

        let actions: Vec<_> = record.next_steps.iter().map(|s| s.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![
                "Contact Top Trial Sites",
                "Research Phase 1 Trials",
                "Prepare for Screening",
                "Consult Your Doctor"
            ]
        );
    }

    #[test]
    fn no_candidates_yields_zero_summary_and_expand_step() {
        let record = assess(required(), Vec::new()).unwrap();
        assert_eq!(record.summary, AssessmentSummary::default());
        assert_eq!(record.next_steps[0].action, "Expand Search Criteria");
        assert_eq!(record.next_steps.last().unwrap().action, "Consult Your Doctor");
        let overall = record
            .insights
            .iter()
            .find(|i| i.category == "Overall Match")
            .unwrap();
        assert_eq!(overall.kind, InsightKind::Warning);
    }

    #[test]
    fn insights_follow_answers() {
        let mut answers = required();
        answers.insert("age", "70");
        answers.insert("previousTreatment", "No previous treatment");
        answers.insert("travelWillingness", "Within 25 miles");
        let mut elderly = trial("NCT9", "Breast Cancer", "PHASE2", "RECRUITING");
        elderly.eligibility = "Elderly patients, no previous therapy".into();

        let record = assess(answers, vec![elderly]).unwrap();
        let kinds: Vec<_> = record
            .insights
            .iter()
            .map(|i| (i.category.as_str(), i.kind))
            .collect();
        assert!(kinds.contains(&("Cancer Type", InsightKind::Positive)));
        assert!(kinds.contains(&("Age", InsightKind::Info)));
        assert!(kinds.contains(&("Treatment History", InsightKind::Positive)));
        assert!(kinds.contains(&("Location", InsightKind::Warning)));

        let age = record.insights.iter().find(|i| i.category == "Age").unwrap();
        assert_eq!(age.trials[0].id, "NCT9");
    }

    #[test]
    fn record_serialises_without_ranked_list() {
        let record = assess(
            required(),
            vec![trial("NCT1", "Breast Cancer", "PHASE1", "RECRUITING")],
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], record.id.to_string());
        assert!(json.get("ranked").is_none());
        assert!(json["nextSteps"].is_array());
        assert_eq!(json["summary"]["totalTrials"], 1);
        assert_eq!(
            json["recommendations"]["topMatches"][0]["matchLevel"],
            "Excellent Match"
        );
    }
}
