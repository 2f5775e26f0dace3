//! The application service behind every API surface.
//!
//! [`TrialsService`] owns the resolved configuration, the trial source, the question catalogue
//! and the assessment store. Handlers call one method per operation and map the
//! [`TrialsError`](crate::TrialsError) they get back.

use crate::analytics::{cancer_type_stats, CancerTypeStats, TrialStatistics};
use crate::answers::Answers;
use crate::assessment::{self, AssessmentRecord};
use crate::assessment_id::AssessmentId;
use crate::config::CoreConfig;
use crate::constants::{CATALOGUE_TERM, DEFAULT_LIST_LIMIT, SAMPLE_SIZE, SUGGESTION_SAMPLE_SIZE};
use crate::geo::{nearby, NearbyQuery, NearbyRequest, NearbyResult};
use crate::insights::{enhanced_insights, EnhancedInsights};
use crate::questions::{Question, QuestionCatalogue};
use crate::search::{self, SearchFilters, SearchPage, SearchQuery};
use crate::source::TrialSource;
use crate::store::AssessmentStore;
use crate::suggestions::{self, SuggestionResponse, SuggestionScope};
use crate::validation::validate_trial_id;
use crate::{TrialsError, TrialsResult};
use chrono::{DateTime, Utc};
use ctgov::ClinicalTrialsClient;
use serde::Serialize;
use std::sync::Arc;
use trial_types::{FilterOptions, Trial};
use utoipa::ToSchema;

/// A single trial as served by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialDetail {
    #[serde(flatten)]
    pub trial: Trial,
    /// Number of entries in `eligibilityCriteria`.
    pub eligibility_count: usize,
    pub last_updated: DateTime<Utc>,
}

// ============================================================================
// TRIALS SERVICE
// ============================================================================

/// Entry point for trial browsing, search and eligibility assessment.
///
/// Cheap to clone; all state is shared behind `Arc`s.
#[derive(Clone)]
pub struct TrialsService {
    cfg: Arc<CoreConfig>,
    source: Arc<dyn TrialSource>,
    store: Arc<AssessmentStore>,
    questions: Arc<QuestionCatalogue>,
}

impl TrialsService {
    /// Creates a service over an explicit trial source.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Resolved core configuration (store bounds, candidate and catalogue sizes)
    /// * `source` - Where trials come from
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::QuestionCatalogue`] if the embedded questionnaire is invalid.
    pub fn new(cfg: Arc<CoreConfig>, source: Arc<dyn TrialSource>) -> TrialsResult<Self> {
        let store = AssessmentStore::new(cfg.assessment_ttl(), cfg.assessment_capacity());
        Ok(Self {
            cfg,
            source,
            store: Arc::new(store),
            questions: Arc::new(QuestionCatalogue::embedded()?),
        })
    }

    /// Creates a service backed by the live registry described in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::Upstream`] if the HTTP client cannot be built, or the errors of
    /// [`TrialsService::new`].
    pub fn from_config(cfg: Arc<CoreConfig>) -> TrialsResult<Self> {
        let client = ClinicalTrialsClient::new(
            cfg.ctgov_base_url(),
            cfg.page_size(),
            cfg.max_pages(),
            cfg.request_timeout(),
        )?;
        Self::new(cfg, Arc::new(client))
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Trials for the default query, one page of them.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::Upstream`] if the registry request fails.
    pub async fn list_trials(&self, page: Option<u32>, limit: Option<u32>) -> TrialsResult<Vec<Trial>> {
        let query = SearchQuery {
            page,
            limit: limit.filter(|l| *l > 0).or(Some(DEFAULT_LIST_LIMIT)),
            ..SearchQuery::default()
        };
        Ok(self.search(&query).await?.trials)
    }

    /// Filtered, sorted and paginated search.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::Upstream`] if the registry request fails.
    pub async fn search(&self, query: &SearchQuery) -> TrialsResult<SearchPage> {
        let filters = SearchFilters::from_query(query);
        let window = filters.prefetch_window(self.source.max_window());
        let term = filters.upstream_term().to_owned();
        tracing::info!(term = %term, window, page = filters.page, "searching trials");

        let fetched = self.source.search(&term, window).await?;
        Ok(search::run(filters, fetched))
    }

    /// Distinct filter values from a sample of the catalogue; empty when the registry fails.
    pub async fn filter_options(&self) -> FilterOptions {
        match self.source.filter_options(CATALOGUE_TERM, SAMPLE_SIZE).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!("filter options unavailable: {}", e);
                FilterOptions::default()
            }
        }
    }

    /// Catalogue statistics; zeros when the registry fails.
    pub async fn statistics(&self) -> TrialStatistics {
        let total = self.source.total_count(CATALOGUE_TERM).await;
        let sample = self.source.search(CATALOGUE_TERM, SAMPLE_SIZE).await;
        match (total, sample) {
            (Ok(total), Ok(sample)) => TrialStatistics::from_sample(total, &sample),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("trial statistics unavailable: {}", e);
                TrialStatistics::default()
            }
        }
    }

    /// One trial by registry ID.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] for a malformed ID (checked before any registry
    /// call), [`TrialsError::TrialNotFound`] when the registry has no such trial, or
    /// [`TrialsError::Upstream`] if the request fails.
    pub async fn trial(&self, id: &str) -> TrialsResult<TrialDetail> {
        validate_trial_id(id)?;
        let trial = self
            .source
            .trial(id)
            .await?
            .ok_or_else(|| TrialsError::TrialNotFound(id.to_owned()))?;
        Ok(TrialDetail {
            eligibility_count: trial.eligibility_criteria.len(),
            last_updated: Utc::now(),
            trial,
        })
    }

    pub fn questions(&self) -> &[Question] {
        self.questions.questions()
    }

    /// Scores the catalogue against `answers`, stores the result and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::MissingAnswers`] or [`TrialsError::MissingFields`] before touching
    /// the registry, or [`TrialsError::Upstream`] if fetching candidates fails.
    pub async fn assess(&self, answers: Answers) -> TrialsResult<AssessmentRecord> {
        assessment::validate_answers(&answers)?;

        let candidates = self
            .source
            .search(CATALOGUE_TERM, self.cfg.candidate_limit())
            .await?
            .into_iter()
            .take(self.cfg.candidate_limit())
            .collect();

        let record = assessment::assess(answers, candidates)?;
        self.store.insert(record.clone());
        Ok(record)
    }

    /// A stored assessment.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] for a malformed ID, or
    /// [`TrialsError::AssessmentNotFound`] when it is unknown or expired.
    pub fn assessment(&self, id: &str) -> TrialsResult<AssessmentRecord> {
        let parsed = AssessmentId::parse(id)?;
        self.store
            .get(&parsed)
            .ok_or_else(|| TrialsError::AssessmentNotFound(id.to_owned()))
    }

    /// Enhanced insights for a stored assessment.
    ///
    /// # Errors
    ///
    /// Same as [`TrialsService::assessment`].
    pub fn insights(&self, id: &str) -> TrialsResult<EnhancedInsights> {
        Ok(enhanced_insights(&self.assessment(id)?))
    }

    /// Autocomplete suggestions; registry failures fall back to the fixed vocabularies.
    pub async fn suggestions(&self, query: &str, kind: &str) -> SuggestionResponse {
        let wants_trials =
            SuggestionScope::parse(kind).wants_trials() && suggestions::is_suggestible(query);
        let trials = if wants_trials {
            match self.source.search(query, SUGGESTION_SAMPLE_SIZE).await {
                Ok(trials) => trials,
                Err(e) => {
                    tracing::warn!("dynamic suggestions unavailable: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        suggestions::suggest(query, kind, &trials)
    }

    /// Catalogue trials near a point.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::InvalidInput`] for missing or out-of-range coordinates (checked
    /// before any registry call), or [`TrialsError::Upstream`] if the registry request fails.
    pub async fn nearby(&self, query: &NearbyQuery) -> TrialsResult<NearbyResult> {
        let request = NearbyRequest::from_query(query)?;
        let catalogue = self.catalogue().await?;
        Ok(nearby(&request, catalogue))
    }

    /// Per-condition statistics over the catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`TrialsError::Upstream`] if the registry request fails.
    pub async fn cancer_type_analytics(&self) -> TrialsResult<Vec<CancerTypeStats>> {
        Ok(cancer_type_stats(&self.catalogue().await?))
    }

    async fn catalogue(&self) -> TrialsResult<Vec<Trial>> {
        let window = self.cfg.catalogue_window().min(self.source.max_window());
        self.source.search(CATALOGUE_TERM, window).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;
    use async_trait::async_trait;
    use trial_types::Coordinates;

    struct FailingSource;

    #[async_trait]
    impl TrialSource for FailingSource {
        async fn search(&self, _term: &str, _window: usize) -> TrialsResult<Vec<Trial>> {
            Err(ctgov::CtGovError::Status {
                status: 503,
                body: "unavailable".into(),
            }
            .into())
        }

        async fn trial(&self, _id: &str) -> TrialsResult<Option<Trial>> {
            self.search("", 0).await.map(|_| None)
        }

        async fn total_count(&self, _term: &str) -> TrialsResult<u64> {
            self.search("", 0).await.map(|_| 0)
        }

        async fn filter_options(&self, _term: &str, _sample: usize) -> TrialsResult<FilterOptions> {
            self.search("", 0).await.map(|_| FilterOptions::default())
        }

        fn max_window(&self) -> usize {
            100
        }
    }

    fn trials() -> Vec<Trial> {
        (1..=3)
            .map(|i| Trial {
                id: format!("NCT0000000{i}"),
                title: format!("Breast Cancer Study {i}"),
                condition: "Breast Cancer".into(),
                phase: "PHASE2".into(),
                status: "RECRUITING".into(),
                location: "Boston, Massachusetts".into(),
                eligibility_criteria: vec!["Age 18 or older".into(), "ECOG 0-1".into()],
                coordinates: Some(Coordinates {
                    lat: 42.36,
                    lng: -71.06,
                }),
                ..Trial::default()
            })
            .collect()
    }

    fn service(source: impl TrialSource + 'static) -> TrialsService {
        TrialsService::new(Arc::new(CoreConfig::default()), Arc::new(source)).unwrap()
    }

    fn required_answers() -> Answers {
        [
            ("age", "45"),
            ("cancerType", "Breast Cancer"),
            ("stage", "Stage II"),
            ("performanceStatus", "ECOG 0 (Fully active, no restrictions)"),
            ("organFunction", "Adequate"),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn assessment_is_stored_and_retrievable() {
        let svc = service(StaticSource::new(trials()));
        let record = svc.assess(required_answers()).await.unwrap();
        assert_eq!(record.summary.total_trials, 3);

        let id = record.id.to_string();
        let stored = svc.assessment(&id).unwrap();
        assert_eq!(stored.id, record.id);
        assert!(svc.insights(&id).unwrap().cancer_type_insights.is_some());

        let unknown = AssessmentId::new().to_string();
        assert!(svc.assessment(&unknown).unwrap_err().is_not_found());
        assert!(svc.assessment("not-an-id").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn validation_happens_before_the_registry_is_called() {
        let svc = service(FailingSource);
        let err = svc.assess(Answers::new()).await.unwrap_err();
        assert!(matches!(err, TrialsError::MissingAnswers));

        let err = svc.trial("../etc").await.unwrap_err();
        assert!(err.is_validation());

        let err = svc.nearby(&NearbyQuery::default()).await.unwrap_err();
        assert!(err.is_validation());

        let err = svc.assess(required_answers()).await.unwrap_err();
        assert!(matches!(err, TrialsError::Upstream(_)));
    }

    #[tokio::test]
    async fn trial_detail_counts_criteria_and_reports_missing() {
        let svc = service(StaticSource::new(trials()));
        let detail = svc.trial("NCT00000002").await.unwrap();
        assert_eq!(detail.eligibility_count, 2);
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], "NCT00000002");
        assert_eq!(json["eligibilityCount"], 2);

        let err = svc.trial("NCT99999999").await.unwrap_err();
        assert!(matches!(err, TrialsError::TrialNotFound(_)));
    }

    #[tokio::test]
    async fn degraded_endpoints_fall_back_to_empty_values() {
        let svc = service(FailingSource);
        assert_eq!(svc.filter_options().await, FilterOptions::default());
        assert_eq!(svc.statistics().await, TrialStatistics::default());

        let res = svc.suggestions("lung", "all").await;
        assert_eq!(res.suggestions[0].value, "Lung Cancer");
    }

    #[tokio::test]
    async fn list_search_nearby_and_analytics_use_the_source() {
        let svc = service(StaticSource::new(trials()));

        assert_eq!(svc.list_trials(None, None).await.unwrap().len(), 3);
        assert_eq!(svc.list_trials(Some(2), Some(2)).await.unwrap().len(), 1);

        let page = svc
            .search(&SearchQuery {
                search_text: Some("study 3".into()),
                ..SearchQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.trials[0].id, "NCT00000003");

        let near = svc
            .nearby(&NearbyQuery {
                lat: Some(42.35),
                lng: Some(-71.05),
                ..NearbyQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(near.total_nearby, 3);

        let stats = svc.cancer_type_analytics().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 3);

        let statistics = svc.statistics().await;
        assert_eq!(statistics.total_trials, 3);
        assert_eq!(statistics.recruiting_trials, 3);
    }
}
