//! Trial browsing endpoints.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trial_types::{FilterOptions, Trial};
use trials_core::analytics::TrialStatistics;
use trials_core::search::{SearchPage, SearchQuery};
use trials_core::validation::lenient_number;
use trials_core::TrialDetail;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page (default 1).
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u32>,
    /// Page size (default 1000).
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FiltersRes {
    pub success: bool,
    pub filters: FilterOptions,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsRes {
    pub success: bool,
    pub statistics: TrialStatistics,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrialRes {
    pub success: bool,
    pub data: TrialDetail,
}

#[utoipa::path(
    get,
    path = "/api/trials",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of trials", body = Vec<Trial>),
        (status = 500, description = "Registry unavailable", body = api_shared::ErrorRes)
    )
)]
/// List trials for the default query
///
/// # Returns
/// * `Ok(Json<Vec<Trial>>)` - The requested page as a bare array
///
/// # Errors
/// Returns `500 Internal Server Error` if the registry request fails.
#[axum::debug_handler]
pub async fn list_trials(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Trial>>, ApiError> {
    state
        .service
        .list_trials(query.page, query.limit)
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to fetch trials", e))
}

#[utoipa::path(
    get,
    path = "/api/trials/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Filtered, sorted page of trials", body = SearchPage),
        (status = 500, description = "Registry unavailable", body = api_shared::ErrorRes)
    )
)]
/// Search trials
///
/// Text criteria go to the registry; every other filter, the sort and the pagination are applied
/// here, in that order.
///
/// # Errors
/// Returns `500 Internal Server Error` if the registry request fails.
#[axum::debug_handler]
pub async fn search_trials(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPage>, ApiError> {
    state
        .service
        .search(&query)
        .await
        .map(Json)
        .map_err(|e| ApiError::new("Failed to search trials", e))
}

#[utoipa::path(
    get,
    path = "/api/trials/filters",
    responses(
        (status = 200, description = "Distinct filter values from a catalogue sample", body = FiltersRes)
    )
)]
/// Available filter values
///
/// Falls back to empty lists when the registry is unavailable.
#[axum::debug_handler]
pub async fn filter_options(State(state): State<AppState>) -> Json<FiltersRes> {
    Json(FiltersRes {
        success: true,
        filters: state.service.filter_options().await,
        last_updated: Utc::now(),
    })
}

#[utoipa::path(
    get,
    path = "/api/trials/stats",
    responses(
        (status = 200, description = "Catalogue statistics", body = StatsRes)
    )
)]
/// Catalogue statistics
///
/// Falls back to zeros when the registry is unavailable.
#[axum::debug_handler]
pub async fn trial_stats(State(state): State<AppState>) -> Json<StatsRes> {
    Json(StatsRes {
        success: true,
        statistics: state.service.statistics().await,
        last_updated: Utc::now(),
    })
}

#[utoipa::path(
    get,
    path = "/api/trials/{id}",
    params(("id" = String, Path, description = "Registry ID, e.g. NCT04567890")),
    responses(
        (status = 200, description = "Trial details", body = TrialRes),
        (status = 400, description = "Malformed trial ID", body = api_shared::ErrorRes),
        (status = 404, description = "No such trial", body = api_shared::ErrorRes),
        (status = 500, description = "Registry unavailable", body = api_shared::ErrorRes)
    )
)]
/// One trial by registry ID
///
/// # Errors
/// Returns `400 Bad Request` for a malformed ID, `404 Not Found` when the registry has no such
/// trial, or `500 Internal Server Error` if the registry request fails.
#[axum::debug_handler]
pub async fn get_trial(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TrialRes>, ApiError> {
    let data = state
        .service
        .trial(&id)
        .await
        .map_err(|e| ApiError::new("Internal server error while fetching trial details", e))?;
    Ok(Json(TrialRes {
        success: true,
        data,
    }))
}
