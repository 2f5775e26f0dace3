//! Ranking of scored trials.
//!
//! Trials are ordered by eligibility score, then by how early their phase is, then by how open
//! their recruitment status is, then by whether they sit in the patient's own location.

use crate::answers::{AnswerField, Answers};
use crate::scoring::{score_trial, FactorOutcome, MatchLevel};
use serde::Serialize;
use trial_types::Trial;
use utoipa::ToSchema;

/// One trial with its score and the tie-breaking priorities used for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoredTrial {
    pub trial: Trial,
    pub eligibility_score: u8,
    pub match_level: MatchLevel,
    pub raw_score: u32,
    pub total_points: u32,
    pub match_details: Vec<FactorOutcome>,
    pub phase_priority: u8,
    pub status_priority: u8,
    pub is_local: bool,
}

impl ScoredTrial {
    pub fn new(trial: Trial, answers: &Answers) -> Self {
        let score = score_trial(&trial, answers);
        let is_local = answers
            .text(AnswerField::Location)
            .is_some_and(|loc| trial.location.to_lowercase().contains(&loc.to_lowercase()));
        Self {
            phase_priority: phase_priority(&trial.phase),
            status_priority: status_priority(&trial.status),
            eligibility_score: score.score,
            match_level: score.match_level,
            raw_score: score.raw_score,
            total_points: score.total_points,
            match_details: score.match_details,
            is_local,
            trial,
        }
    }

    /// True when `factor` took part in the score and matched.
    pub fn matched(&self, factor: crate::scoring::Factor) -> bool {
        self.match_details
            .iter()
            .any(|d| d.factor == factor && d.matched)
    }
}

/// Priority of the earliest phase named in `phase`: phase 1 → 100, 2 → 80, 3 → 60, 4 → 40.
///
/// Accepts registry tokens (`PHASE1, PHASE2`) and display forms (`Phase 1`) alike.
pub fn phase_priority(phase: &str) -> u8 {
    let compact = crate::scoring::compact_phase(phase);
    match (1..=4).find(|n| compact.contains(&format!("phase{n}"))) {
        Some(1) => 100,
        Some(2) => 80,
        Some(3) => 60,
        Some(4) => 40,
        _ => 0,
    }
}

/// Lower-cased status with underscores and commas turned into single spaces.
pub fn normalize_status(status: &str) -> String {
    status
        .to_lowercase()
        .replace(['_', ','], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Priority of a recruitment status; open trials rank above closed ones.
pub fn status_priority(status: &str) -> u8 {
    match normalize_status(status).as_str() {
        "recruiting" => 100,
        "active" | "active not recruiting" => 80,
        "open" | "not yet recruiting" | "enrolling by invitation" => 60,
        "not recruiting" => 40,
        "completed" => 20,
        _ => 0,
    }
}

/// Scores every trial against `answers` and returns them best first.
///
/// The sort is stable, so full ties keep the candidates' original order.
pub fn rank(trials: Vec<Trial>, answers: &Answers) -> Vec<ScoredTrial> {
    let mut scored: Vec<ScoredTrial> = trials
        .into_iter()
        .map(|trial| ScoredTrial::new(trial, answers))
        .collect();

    scored.sort_by(|a, b| {
        b.eligibility_score
            .cmp(&a.eligibility_score)
            .then(b.phase_priority.cmp(&a.phase_priority))
            .then(b.status_priority.cmp(&a.status_priority))
            .then(b.is_local.cmp(&a.is_local))
    });
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(id: &str, phase: &str, status: &str, location: &str) -> Trial {
        Trial {
            id: id.into(),
            condition: "Breast Cancer".into(),
            phase: phase.into(),
            status: status.into(),
            location: location.into(),
            ..Trial::default()
        }
    }

    #[test]
    fn phase_priority_uses_earliest_phase() {
        assert_eq!(phase_priority("PHASE1"), 100);
        assert_eq!(phase_priority("PHASE2, PHASE3"), 80);
        assert_eq!(phase_priority("Phase 3"), 60);
        assert_eq!(phase_priority("PHASE4"), 40);
        assert_eq!(phase_priority("EARLY_PHASE1"), 100);
        assert_eq!(phase_priority("Not specified"), 0);
    }

    #[test]
    fn status_priority_normalises_registry_codes() {
        assert_eq!(status_priority("RECRUITING"), 100);
        assert_eq!(status_priority("ACTIVE_NOT_RECRUITING"), 80);
        assert_eq!(status_priority("NOT_YET_RECRUITING"), 60);
        assert_eq!(status_priority("Enrolling by invitation"), 60);
        assert_eq!(status_priority("COMPLETED"), 20);
        assert_eq!(status_priority("TERMINATED"), 0);
    }

    #[test]
    fn ties_break_on_phase_then_status_then_location() {
        let answers: Answers = [("cancerType", "Breast Cancer"), ("location", "Boston")]
            .into_iter()
            .collect();
        let ranked = rank(
            vec![
                trial("A", "PHASE3", "RECRUITING", "Boston, MA"),
                trial("B", "PHASE1", "COMPLETED", "Chicago, IL"),
                trial("C", "PHASE3", "RECRUITING", "Denver, CO"),
                trial("D", "PHASE3", "COMPLETED", "Boston, MA"),
                trial("E", "PHASE3", "RECRUITING", "Austin, TX"),
            ],
            &answers,
        );
        let ids: Vec<_> = ranked.iter().map(|s| s.trial.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C", "E", "D"]);
        assert!(ranked.iter().all(|s| s.eligibility_score == 100));
    }

    #[test]
    fn higher_scores_rank_first() {
        let answers: Answers = [("cancerType", "Melanoma")].into_iter().collect();
        let mut melanoma = trial("M", "PHASE3", "COMPLETED", "");
        melanoma.condition = "Melanoma".into();
        let ranked = rank(
            vec![trial("X", "PHASE1", "RECRUITING", ""), melanoma],
            &answers,
        );
        assert_eq!(ranked[0].trial.id, "M");
        assert_eq!(ranked[1].eligibility_score, 0);
    }
}
