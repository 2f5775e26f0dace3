//! # API REST
//!
//! REST API implementation for the trials backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, CORS, error-to-status mapping)
//!
//! Business logic lives in `trials-core`; this crate only adapts it to HTTP.

#![warn(rust_2018_idioms)]

pub mod discovery;
pub mod eligibility;
pub mod error;
pub mod trials;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use trials_core::TrialsService;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every REST handler.
#[derive(Clone)]
pub struct AppState {
    pub service: TrialsService,
}

impl AppState {
    pub fn new(service: TrialsService) -> Self {
        Self { service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        discovery::health,
        trials::list_trials,
        trials::search_trials,
        trials::filter_options,
        trials::trial_stats,
        trials::get_trial,
        eligibility::questions,
        eligibility::assess,
        eligibility::assessment,
        eligibility::insights,
        discovery::suggestions,
        discovery::nearby_trials,
        discovery::cancer_types,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        trial_types::Trial,
        trial_types::Coordinates,
        trial_types::CentralContact,
        trial_types::FilterOptions,
        trials::FiltersRes,
        trials::StatsRes,
        trials::TrialRes,
        trials_core::TrialDetail,
        trials_core::analytics::TrialStatistics,
        trials_core::analytics::CancerTypeStats,
        trials_core::search::SearchPage,
        trials_core::search::SearchFilters,
        trials_core::search::SortBy,
        trials_core::search::SortOrder,
        trials_core::questions::Question,
        trials_core::questions::QuestionType,
        trials_core::questions::NumberRange,
        eligibility::AssessRes,
        eligibility::InsightsRes,
        trials_core::AssessmentRecord,
        trials_core::assessment::AssessmentSummary,
        trials_core::assessment::Recommendations,
        trials_core::assessment::Insight,
        trials_core::assessment::InsightKind,
        trials_core::assessment::TrialRef,
        trials_core::assessment::NextStep,
        trials_core::assessment::Priority,
        trials_core::ScoredTrial,
        trials_core::scoring::FactorOutcome,
        trials_core::scoring::MatchLevel,
        trials_core::scoring::Weight,
        trials_core::insights::EnhancedInsights,
        trials_core::insights::CancerTypeInsights,
        trials_core::insights::EligibilityInsight,
        trials_core::insights::EligibilityAspect,
        trials_core::insights::LocationInsights,
        trials_core::insights::TreatmentInsights,
        trials_core::insights::PhaseInsights,
        trials_core::insights::EnhancedRecommendation,
        trials_core::insights::RecommendationKind,
        trials_core::suggestions::SuggestionResponse,
        trials_core::suggestions::Suggestion,
        discovery::NearbyRes,
        discovery::CancerTypesRes,
        trials_core::geo::NearbyResult,
        trials_core::geo::NearbyTrial,
        trials_core::geo::DistanceGroups,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router: every `/api` route, Swagger UI and permissive CORS.
///
/// # Arguments
/// * `state` - Shared handler state
///
/// # Returns
/// A `Router` ready to be served.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(discovery::health))
        .route("/api/trials", get(trials::list_trials))
        .route("/api/trials/search", get(trials::search_trials))
        .route("/api/trials/filters", get(trials::filter_options))
        .route("/api/trials/stats", get(trials::trial_stats))
        .route("/api/trials/:id", get(trials::get_trial))
        .route("/api/eligibility/questions", get(eligibility::questions))
        .route("/api/eligibility/assess", post(eligibility::assess))
        .route("/api/eligibility/assessment/:id", get(eligibility::assessment))
        .route("/api/eligibility/insights/:id", get(eligibility::insights))
        .route("/api/search/suggestions", get(discovery::suggestions))
        .route("/api/geolocation/nearby-trials", get(discovery::nearby_trials))
        .route("/api/analytics/cancer-types", get(discovery::cancer_types))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use trial_types::{Coordinates, Trial};
    use trials_core::{CoreConfig, StaticSource};

    fn catalogue() -> Vec<Trial> {
        vec![
            Trial {
                id: "NCT04000001".into(),
                title: "Pembrolizumab in Advanced Lung Cancer".into(),
                condition: "Lung Cancer".into(),
                phase: "PHASE2".into(),
                status: "RECRUITING".into(),
                location: "Boston, Massachusetts".into(),
                treatment_type: "DRUG".into(),
                eligibility_criteria: vec!["Age 18 or older".into()],
                coordinates: Some(Coordinates {
                    lat: 42.36,
                    lng: -71.06,
                }),
                ..Trial::default()
            },
            Trial {
                id: "NCT04000002".into(),
                title: "Radiation for Early Breast Cancer".into(),
                condition: "Breast Cancer".into(),
                phase: "PHASE3".into(),
                status: "COMPLETED".into(),
                location: "Houston, Texas".into(),
                treatment_type: "RADIATION".into(),
                ..Trial::default()
            },
        ]
    }

    fn app() -> Router {
        let service = TrialsService::new(
            Arc::new(CoreConfig::default()),
            Arc::new(StaticSource::new(catalogue())),
        )
        .unwrap();
        router(AppState::new(service))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = get_json(app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "OK", "message": "Backend is running" }));
    }

    #[tokio::test]
    async fn list_and_search() {
        let (status, body) = get_json(app(), "/api/trials").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = get_json(app(), "/api/trials/search?status=recruiting&limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["trials"][0]["id"], "NCT04000001");
        assert_eq!(body["hasNextPage"], false);
        assert_eq!(body["limit"], 5);
    }

    #[tokio::test]
    async fn malformed_numbers_fall_back_to_defaults() {
        let (status, body) = get_json(app(), "/api/trials/search?page=abc&limit=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["total"], 2);

        let (status, body) = get_json(app(), "/api/trials?page=x").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) =
            get_json(app(), "/api/geolocation/nearby-trials?lat=x&lng=-71.05").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
        assert_eq!(body["message"], "Latitude and longitude are required");
    }

    #[tokio::test]
    async fn static_routes_win_over_trial_id() {
        let (status, body) = get_json(app(), "/api/trials/filters").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["filters"]["cancerTypes"], json!(["Breast Cancer", "Lung Cancer"]));

        let (status, body) = get_json(app(), "/api/trials/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statistics"]["totalTrials"], 2);
    }

    #[tokio::test]
    async fn trial_detail_statuses() {
        let (status, body) = get_json(app(), "/api/trials/NCT04000001").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "NCT04000001");
        assert_eq!(body["data"]["eligibilityCount"], 1);

        let (status, body) = get_json(app(), "/api/trials/NCT09999999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Trial not found");

        let (status, _) = get_json(app(), "/api/trials/bad%20id").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assessment_round_trip() {
        let app = app();
        let answers = json!({
            "age": "52",
            "cancerType": "Lung Cancer",
            "stage": "Stage III",
            "performanceStatus": "ECOG 1 (Restricted in strenuous activity)",
            "organFunction": "Adequate",
            "treatmentPreferences": ["Immunotherapy"]
        });
        let (status, body) = send(app.clone(), post_json("/api/eligibility/assess", answers)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["summary"]["totalTrials"], 2);
        let id = body["assessmentId"].as_str().unwrap().to_owned();

        let (status, stored) =
            get_json(app.clone(), &format!("/api/eligibility/assessment/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["id"], id.as_str());

        let (status, insights) = get_json(app, &format!("/api/eligibility/insights/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(insights["assessmentId"], id.as_str());
        assert!(insights["insights"]["cancerTypeInsights"].is_object());
    }

    #[tokio::test]
    async fn assessment_validation() {
        let (status, body) = send(app(), post_json("/api/eligibility/assess", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Assessment answers are required");

        let (status, body) = send(
            app(),
            post_json("/api/eligibility/assess", json!({ "age": "40" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["missingFields"],
            json!(["cancerType", "stage", "performanceStatus", "organFunction"])
        );

        let unknown = trials_core::AssessmentId::new();
        let (status, _) =
            get_json(app(), &format!("/api/eligibility/assessment/{unknown}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn discovery_endpoints() {
        let (status, body) = get_json(app(), "/api/eligibility/questions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 15);

        let (_, body) = get_json(app(), "/api/search/suggestions?q=pembro").await;
        assert_eq!(body["type"], "all");
        assert_eq!(body["suggestions"][0]["trialId"], "NCT04000001");

        let (status, body) =
            get_json(app(), "/api/geolocation/nearby-trials?lat=42.35&lng=-71.05").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["totalNearby"], 1);

        let (status, _) = get_json(app(), "/api/geolocation/nearby-trials?lat=42.35").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(app(), "/api/analytics/cancer-types").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCancerTypes"], 2);
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.paths.paths.len(), 13);
        assert!(doc.paths.paths.contains_key("/api/trials/{id}"));
    }
}
