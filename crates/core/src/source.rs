//! Where trials come from.
//!
//! [`TrialSource`] is the seam between the business logic and the registry. The live
//! implementation is [`ctgov::ClinicalTrialsClient`]; [`StaticSource`] serves a fixed list and is
//! used by tests and by the CLI's `--fixture` mode.

use crate::{TrialsError, TrialsResult};
use async_trait::async_trait;
use ctgov::ClinicalTrialsClient;
use std::collections::BTreeSet;
use trial_types::{FilterOptions, Trial};

#[async_trait]
pub trait TrialSource: Send + Sync {
    /// Up to `window` trials matching the free-text `term`, in registry order.
    async fn search(&self, term: &str, window: usize) -> TrialsResult<Vec<Trial>>;

    /// One trial by registry ID; `None` when it does not exist.
    async fn trial(&self, id: &str) -> TrialsResult<Option<Trial>>;

    /// Number of registry records matching `term`.
    async fn total_count(&self, term: &str) -> TrialsResult<u64>;

    /// Distinct filter values from the first `sample` records matching `term`.
    async fn filter_options(&self, term: &str, sample: usize) -> TrialsResult<FilterOptions>;

    /// Largest window a single search may request.
    fn max_window(&self) -> usize;
}

#[async_trait]
impl TrialSource for ClinicalTrialsClient {
    async fn search(&self, term: &str, window: usize) -> TrialsResult<Vec<Trial>> {
        let studies = self.search_studies(term, window).await?;
        Ok(studies.iter().map(ctgov::to_trial).collect())
    }

    async fn trial(&self, id: &str) -> TrialsResult<Option<Trial>> {
        Ok(self.get_study(id).await?.as_ref().map(ctgov::to_trial))
    }

    async fn total_count(&self, term: &str) -> TrialsResult<u64> {
        Ok(self.count_studies(term).await?)
    }

    async fn filter_options(&self, term: &str, sample: usize) -> TrialsResult<FilterOptions> {
        let studies = self.search_studies(term, sample).await?;
        Ok(ctgov::filter_options(&studies))
    }

    fn max_window(&self) -> usize {
        ClinicalTrialsClient::max_window(self)
    }
}

/// An in-memory source that ignores the search term and serves its trials in order.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    trials: Vec<Trial>,
}

impl StaticSource {
    pub fn new(trials: Vec<Trial>) -> Self {
        Self { trials }
    }

    /// Parses a JSON array of trials in the API's camelCase shape.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] naming the failing JSON path when the document does
    /// not match.
    pub fn from_json(json: &str) -> TrialsResult<Self> {
        let mut de = serde_json::Deserializer::from_str(json);
        let trials: Vec<Trial> = serde_path_to_error::deserialize(&mut de).map_err(|e| {
            let path = e.path().to_string();
            let path = if path.is_empty() { "<root>".into() } else { path };
            TrialsError::InvalidInput(format!("trial fixture invalid at {path}: {}", e.inner()))
        })?;
        Ok(Self::new(trials))
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }
}

fn first_segment(value: &str) -> &str {
    value.split(',').next().unwrap_or_default().trim()
}

#[async_trait]
impl TrialSource for StaticSource {
    async fn search(&self, _term: &str, window: usize) -> TrialsResult<Vec<Trial>> {
        Ok(self.trials.iter().take(window).cloned().collect())
    }

    async fn trial(&self, id: &str) -> TrialsResult<Option<Trial>> {
        Ok(self.trials.iter().find(|t| t.id == id).cloned())
    }

    async fn total_count(&self, _term: &str) -> TrialsResult<u64> {
        Ok(self.trials.len() as u64)
    }

    async fn filter_options(&self, _term: &str, sample: usize) -> TrialsResult<FilterOptions> {
        let mut cancer_types = BTreeSet::new();
        let mut phases = BTreeSet::new();
        let mut locations = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut treatment_types = BTreeSet::new();

        for trial in self.trials.iter().take(sample) {
            let fields = [
                (&mut cancer_types, first_segment(&trial.condition)),
                (&mut phases, first_segment(&trial.phase)),
                (&mut locations, first_segment(&trial.location)),
                (&mut statuses, trial.status.trim()),
                (&mut treatment_types, first_segment(&trial.treatment_type)),
            ];
            for (set, value) in fields {
                if !value.is_empty() {
                    set.insert(value.to_owned());
                }
            }
        }

        Ok(FilterOptions {
            cancer_types: cancer_types.into_iter().collect(),
            phases: phases.into_iter().collect(),
            locations: locations.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
            treatment_types: treatment_types.into_iter().collect(),
        })
    }

    fn max_window(&self) -> usize {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_serves_fixture_in_order() {
        let source = StaticSource::from_json(
            r#"[
                {"id": "NCT1", "condition": "Lung Cancer, NSCLC", "location": "Boston, MA", "status": "RECRUITING"},
                {"id": "NCT2", "condition": "Breast Cancer", "location": "Austin, TX", "status": "COMPLETED"}
            ]"#,
        )
        .unwrap();

        let first = source.search("anything", 1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "NCT1");
        assert!(source.trial("NCT2").await.unwrap().is_some());
        assert!(source.trial("NCT3").await.unwrap().is_none());
        assert_eq!(source.total_count("x").await.unwrap(), 2);

        let options = source.filter_options("x", 10).await.unwrap();
        assert_eq!(options.cancer_types, vec!["Breast Cancer", "Lung Cancer"]);
        assert_eq!(options.locations, vec!["Austin", "Boston"]);
        assert_eq!(options.statuses, vec!["COMPLETED", "RECRUITING"]);
        assert!(options.phases.is_empty());
    }

    #[test]
    fn fixture_errors_name_the_path() {
        let err = StaticSource::from_json(r#"[{"id": 7}]"#).unwrap_err();
        assert!(err.to_string().contains("[0].id"), "{err}");
    }
}
