//! Enhanced insights computed on demand for a stored assessment.

use crate::answers::AnswerField;
use crate::assessment::{AssessmentRecord, Priority};
use crate::ranking::ScoredTrial;
use crate::scoring::{phase_preference_matches, treatment_preference_matches, Factor};
use serde::Serialize;
use trial_types::Trial;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancerTypeInsights {
    pub exact_matches: usize,
    pub related_matches: usize,
    pub top_exact_match: Option<ScoredTrial>,
    pub top_related_match: Option<ScoredTrial>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityAspect {
    Age,
    Performance,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EligibilityInsight {
    #[serde(rename = "type")]
    pub aspect: EligibilityAspect,
    pub message: String,
    pub trials: Vec<ScoredTrial>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationInsights {
    pub local_trials: usize,
    pub nearby_trials: usize,
    pub top_local_trial: Option<ScoredTrial>,
    pub top_nearby_trial: Option<ScoredTrial>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentInsights {
    pub preferred_treatment_trials: usize,
    pub top_preferred_trial: Option<ScoredTrial>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInsights {
    pub preferred_phase_trials: usize,
    pub top_preferred_phase_trial: Option<ScoredTrial>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    TopMatch,
    LocalTrial,
    PhaseSpecific,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EnhancedRecommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
    pub trial: Trial,
    pub score: u8,
}

/// All enhanced sections; a section is `null` when the answer it depends on is absent.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedInsights {
    pub cancer_type_insights: Option<CancerTypeInsights>,
    pub eligibility_insights: Vec<EligibilityInsight>,
    pub location_insights: Option<LocationInsights>,
    pub treatment_insights: Option<TreatmentInsights>,
    pub phase_insights: Option<PhaseInsights>,
    pub recommendations: Vec<EnhancedRecommendation>,
}

fn lc_contains(haystack: &str, needle_lc: &str) -> bool {
    haystack.to_lowercase().contains(needle_lc)
}

fn treatment_matches(trial: &ScoredTrial, prefs: &[&str]) -> bool {
    let text = format!(
        "{} {} {} {}",
        trial.trial.title, trial.trial.description, trial.trial.eligibility, trial.trial.treatment_type
    )
    .to_lowercase();
    prefs.iter().any(|p| treatment_preference_matches(p, &text))
}

fn phase_matches(trial: &ScoredTrial, prefs: &[&str]) -> bool {
    prefs
        .iter()
        .any(|p| phase_preference_matches(p, &trial.trial.phase))
}

/// Derives the enhanced insight sections for `record` from its ranked trials.
pub fn enhanced_insights(record: &AssessmentRecord) -> EnhancedInsights {
    let answers = &record.answers;
    let ranked = &record.ranked;

    let cancer_type_insights = answers
        .text(AnswerField::CancerType)
        .filter(|ct| !ct.eq_ignore_ascii_case("other"))
        .map(|ct| {
            let ct_lc = ct.to_lowercase();
            let (exact, related): (Vec<&ScoredTrial>, Vec<&ScoredTrial>) = ranked
                .iter()
                .partition(|t| lc_contains(&t.trial.condition, &ct_lc));
            let related: Vec<_> = related
                .into_iter()
                .filter(|t| t.eligibility_score >= 70)
                .collect();
            CancerTypeInsights {
                exact_matches: exact.len(),
                related_matches: related.len(),
                top_exact_match: exact.first().map(|t| (*t).clone()),
                top_related_match: related.first().map(|t| (*t).clone()),
                message: format!(
                    "Found {} exact matches and {} related trials for {ct}",
                    exact.len(),
                    related.len()
                ),
            }
        });

    let mut eligibility_insights = Vec::new();
    if let Some(age) = answers.age().filter(|a| *a > 0) {
        let suitable: Vec<_> = ranked
            .iter()
            .filter(|t| t.matched(Factor::Age))
            .collect();
        eligibility_insights.push(EligibilityInsight {
            aspect: EligibilityAspect::Age,
            message: format!("Your age ({age}) is appropriate for {} trials", suitable.len()),
            trials: suitable.into_iter().take(3).cloned().collect(),
        });
    }
    if answers.get(AnswerField::PerformanceStatus).is_some() {
        let suitable: Vec<_> = ranked
            .iter()
            .filter(|t| t.eligibility_score >= 80)
            .collect();
        eligibility_insights.push(EligibilityInsight {
            aspect: EligibilityAspect::Performance,
            message: format!(
                "Your performance status allows participation in {} trials",
                suitable.len()
            ),
            trials: suitable.into_iter().take(3).cloned().collect(),
        });
    }

    let location = answers.text(AnswerField::Location).map(str::to_lowercase);
    let location_insights = location.as_deref().map(|loc| {
        let (local, elsewhere): (Vec<&ScoredTrial>, Vec<&ScoredTrial>) = ranked
            .iter()
            .partition(|t| lc_contains(&t.trial.location, loc));
        let nearby: Vec<_> = elsewhere
            .into_iter()
            .filter(|t| t.eligibility_score >= 75)
            .collect();
        LocationInsights {
            local_trials: local.len(),
            nearby_trials: nearby.len(),
            top_local_trial: local.first().map(|t| (*t).clone()),
            top_nearby_trial: nearby.first().map(|t| (*t).clone()),
            message: format!(
                "Found {} local trials and {} nearby trials",
                local.len(),
                nearby.len()
            ),
        }
    });

    let treatment_prefs = answers.items(AnswerField::TreatmentPreferences);
    let treatment_insights = (!treatment_prefs.is_empty()).then(|| {
        let preferred: Vec<_> = ranked
            .iter()
            .filter(|t| treatment_matches(t, &treatment_prefs))
            .collect();
        TreatmentInsights {
            preferred_treatment_trials: preferred.len(),
            top_preferred_trial: preferred.first().map(|t| (*t).clone()),
            message: format!(
                "Found {} trials matching your treatment preference",
                preferred.len()
            ),
        }
    });

    let phase_prefs = answers.items(AnswerField::TrialPhasePreferences);
    let phase_insights = (!phase_prefs.is_empty()).then(|| {
        let preferred: Vec<_> = ranked
            .iter()
            .filter(|t| phase_matches(t, &phase_prefs))
            .collect();
        PhaseInsights {
            preferred_phase_trials: preferred.len(),
            top_preferred_phase_trial: preferred.first().map(|t| (*t).clone()),
            message: format!(
                "Found {} trials in your preferred phase ({})",
                preferred.len(),
                phase_prefs.join(", ")
            ),
        }
    });

    let mut recommendations = Vec::new();
    if let Some(top) = ranked.first().filter(|t| t.eligibility_score >= 90) {
        recommendations.push(EnhancedRecommendation {
            kind: RecommendationKind::TopMatch,
            priority: Priority::High,
            message: format!("Excellent match: {}", top.trial.title),
            trial: top.trial.clone(),
            score: top.eligibility_score,
        });
    }
    if let Some(loc) = location.as_deref() {
        if let Some(local) = ranked
            .iter()
            .find(|t| lc_contains(&t.trial.location, loc) && t.eligibility_score >= 80)
        {
            recommendations.push(EnhancedRecommendation {
                kind: RecommendationKind::LocalTrial,
                priority: Priority::Medium,
                message: format!("Local trial available: {}", local.trial.title),
                trial: local.trial.clone(),
                score: local.eligibility_score,
            });
        }
    }
    if !phase_prefs.is_empty() {
        if let Some(phase_trial) = ranked
            .iter()
            .find(|t| phase_matches(t, &phase_prefs) && t.eligibility_score >= 75)
        {
            recommendations.push(EnhancedRecommendation {
                kind: RecommendationKind::PhaseSpecific,
                priority: Priority::Medium,
                message: format!(
                    "{} trial: {}",
                    phase_trial.trial.phase, phase_trial.trial.title
                ),
                trial: phase_trial.trial.clone(),
                score: phase_trial.eligibility_score,
            });
        }
    }

    EnhancedInsights {
        cancer_type_insights,
        eligibility_insights,
        location_insights,
        treatment_insights,
        phase_insights,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::Answers;
    use crate::assessment::assess;

    fn answers(extra: &[(&str, &str)]) -> Answers {
        let mut answers: Answers = [
            ("age", "50"),
            ("cancerType", "Breast Cancer"),
            ("stage", "Advanced"),
            ("performanceStatus", "ECOG 0 (Fully active, no restrictions)"),
            ("organFunction", "Adequate"),
        ]
        .into_iter()
        .collect();
        for (k, v) in extra {
            answers.insert(*k, *v);
        }
        answers
    }

    fn trial(id: &str, condition: &str, location: &str, phase: &str) -> Trial {
        Trial {
            id: id.into(),
            title: format!("{condition} trial {id}"),
            condition: condition.into(),
            location: location.into(),
            phase: phase.into(),
            description: "advanced disease".into(),
            eligibility: "Adults 18 to 75, good performance status, adequate organ function".into(),
            ..Trial::default()
        }
    }

    #[test]
    fn absent_answers_leave_sections_null() {
        let record = assess(answers(&[]), vec![trial("NCT1", "Breast Cancer", "Boston", "PHASE2")])
            .unwrap();
        let insights = enhanced_insights(&record);
        assert!(insights.cancer_type_insights.is_some());
        assert!(insights.location_insights.is_none());
        assert!(insights.treatment_insights.is_none());
        assert!(insights.phase_insights.is_none());

        let json = serde_json::to_value(&insights).unwrap();
        assert!(json["locationInsights"].is_null());
        assert!(json["phaseInsights"].is_null());
    }

    #[test]
    fn sections_follow_the_ranked_trials() {
        let record = assess(
            answers(&[
                ("location", "boston"),
                ("trial-phase-preferences", "Phase 2 (Effectiveness testing)"),
            ]),
            vec![
                trial("NCT1", "Breast Cancer", "Boston, MA", "PHASE2"),
                trial("NCT2", "Solid Tumors", "Chicago, IL", "PHASE3"),
            ],
        )
        .unwrap();
        let insights = enhanced_insights(&record);

        let ct = insights.cancer_type_insights.unwrap();
        assert_eq!(ct.exact_matches, 1);
        assert_eq!(ct.top_exact_match.unwrap().trial.id, "NCT1");

        let loc = insights.location_insights.unwrap();
        assert_eq!(loc.local_trials, 1);

        let phase = insights.phase_insights.unwrap();
        assert_eq!(phase.preferred_phase_trials, 1);

        let kinds: Vec<_> = insights.recommendations.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::TopMatch,
                RecommendationKind::LocalTrial,
                RecommendationKind::PhaseSpecific
            ]
        );
        assert_eq!(insights.eligibility_insights.len(), 2);
        assert_eq!(insights.eligibility_insights[0].aspect, EligibilityAspect::Age);
    }
}
