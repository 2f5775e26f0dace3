//! Health, autocomplete, nearby and analytics endpoints.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{HealthRes, HealthService};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use trials_core::analytics::CancerTypeStats;
use trials_core::geo::{NearbyQuery, NearbyResult};
use trials_core::suggestions::{SuggestionQuery, SuggestionResponse};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRes {
    pub success: bool,
    #[serde(flatten)]
    pub result: NearbyResult,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancerTypesRes {
    pub success: bool,
    pub total_cancer_types: usize,
    /// Most common condition first.
    pub cancer_type_stats: Vec<CancerTypeStats>,
    pub last_updated: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Always `OK` while the process is serving requests
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/search/suggestions",
    params(SuggestionQuery),
    responses(
        (status = 200, description = "Autocomplete suggestions", body = SuggestionResponse)
    )
)]
/// Search-box autocomplete
///
/// Queries shorter than two characters produce an empty list. Registry failures only drop the
/// dynamic trial suggestions.
#[axum::debug_handler]
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Json<SuggestionResponse> {
    let q = query.q.unwrap_or_default();
    let kind = query.kind.unwrap_or_else(|| "all".into());
    Json(state.service.suggestions(&q, &kind).await)
}

#[utoipa::path(
    get,
    path = "/api/geolocation/nearby-trials",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Trials within the radius, nearest first", body = NearbyRes),
        (status = 400, description = "Missing or invalid coordinates", body = api_shared::ErrorRes),
        (status = 500, description = "Registry unavailable", body = api_shared::ErrorRes)
    )
)]
/// Trials near a point
///
/// # Errors
/// Returns `400 Bad Request` when `lat` or `lng` is missing or out of range, or
/// `500 Internal Server Error` if the registry request fails.
#[axum::debug_handler]
pub async fn nearby_trials(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyRes>, ApiError> {
    let result = state.service.nearby(&query).await.map_err(|e| {
        ApiError::new("Internal server error while processing geolocation request", e)
    })?;
    Ok(Json(NearbyRes {
        success: true,
        result,
        last_updated: Utc::now(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/analytics/cancer-types",
    responses(
        (status = 200, description = "Per-condition statistics", body = CancerTypesRes),
        (status = 500, description = "Registry unavailable", body = api_shared::ErrorRes)
    )
)]
/// Per-condition statistics over the catalogue
///
/// # Errors
/// Returns `500 Internal Server Error` if the registry request fails.
#[axum::debug_handler]
pub async fn cancer_types(State(state): State<AppState>) -> Result<Json<CancerTypesRes>, ApiError> {
    let stats = state.service.cancer_type_analytics().await.map_err(|e| {
        ApiError::new("Internal server error while processing cancer type analytics", e)
    })?;
    Ok(Json(CancerTypesRes {
        success: true,
        total_cancer_types: stats.len(),
        cancer_type_stats: stats,
        last_updated: Utc::now(),
    }))
}
