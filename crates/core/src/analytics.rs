//! Aggregate views over the trial catalogue.

use crate::constants::NO_LOCATION;
use crate::ranking::{normalize_status, status_priority};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use trial_types::Trial;
use utoipa::ToSchema;

/// Distribution of trials for one condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancerTypeStats {
    pub condition: String,
    pub count: usize,
    pub phases: BTreeMap<String, usize>,
    pub statuses: BTreeMap<String, usize>,
    pub treatment_types: BTreeMap<String, usize>,
    /// Distinct first segments (city) of the trial locations, in first-seen order.
    pub locations: Vec<String>,
    pub total_participants: u64,
}

/// Groups `trials` by condition, most common first; ties keep alphabetical order.
pub fn cancer_type_stats(trials: &[Trial]) -> Vec<CancerTypeStats> {
    let mut by_condition: HashMap<&str, CancerTypeStats> = HashMap::new();

    for trial in trials {
        let stats = by_condition
            .entry(trial.condition.as_str())
            .or_insert_with(|| CancerTypeStats {
                condition: trial.condition.clone(),
                ..CancerTypeStats::default()
            });

        stats.count += 1;
        *stats.phases.entry(trial.phase.clone()).or_default() += 1;
        *stats.statuses.entry(trial.status.clone()).or_default() += 1;
        if !trial.treatment_type.is_empty() {
            *stats
                .treatment_types
                .entry(trial.treatment_type.clone())
                .or_default() += 1;
        }

        let city = trial.location.split(',').next().unwrap_or_default().trim();
        if !stats.locations.iter().any(|l| l == city) {
            stats.locations.push(city.to_owned());
        }
        stats.total_participants += trial.participant_count();
    }

    let mut stats: Vec<_> = by_condition.into_values().collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.condition.cmp(&b.condition)));
    stats
}

/// Headline numbers for the landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatistics {
    /// Registry-wide count for the catalogue query.
    pub total_trials: u64,
    /// Open trials within the sample (recruiting, active or not yet recruiting).
    pub active_trials: usize,
    pub recruiting_trials: usize,
    /// Distinct trial locations within the sample.
    pub research_locations: usize,
    pub sample_size: usize,
}

impl TrialStatistics {
    pub fn from_sample(total_trials: u64, sample: &[Trial]) -> Self {
        let locations: BTreeSet<&str> = sample
            .iter()
            .map(|t| t.location.as_str())
            .filter(|l| !l.is_empty() && *l != NO_LOCATION)
            .collect();
        Self {
            total_trials,
            active_trials: sample
                .iter()
                .filter(|t| status_priority(&t.status) >= 60)
                .count(),
            recruiting_trials: sample
                .iter()
                .filter(|t| normalize_status(&t.status) == "recruiting")
                .count(),
            research_locations: locations.len(),
            sample_size: sample.len(),
        }
    }
}
