//! Questionnaire and assessment endpoints.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use trials_core::insights::EnhancedInsights;
use trials_core::questions::Question;
use trials_core::{AssessmentRecord, Answers, TrialsError};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessRes {
    pub success: bool,
    pub message: String,
    pub assessment_id: String,
    pub result: AssessmentRecord,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsRes {
    pub success: bool,
    pub assessment_id: String,
    pub insights: EnhancedInsights,
    pub last_updated: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/eligibility/questions",
    responses(
        (status = 200, description = "The eligibility questionnaire", body = Vec<Question>)
    )
)]
/// The eligibility questionnaire, in display order
#[axum::debug_handler]
pub async fn questions(State(state): State<AppState>) -> Json<Vec<Question>> {
    Json(state.service.questions().to_vec())
}

#[utoipa::path(
    post,
    path = "/api/eligibility/assess",
    request_body(
        content = std::collections::HashMap<String, serde_json::Value>,
        description = "Answers keyed by question field; multi-select answers are arrays"
    ),
    responses(
        (status = 200, description = "Assessment completed and stored", body = AssessRes),
        (status = 400, description = "Answers missing or incomplete", body = api_shared::ErrorRes),
        (status = 500, description = "Registry unavailable", body = api_shared::ErrorRes)
    )
)]
/// Assess eligibility against the trial catalogue
///
/// The answers are validated before the registry is contacted. The stored result can be
/// fetched again with the returned `assessmentId` until it expires.
///
/// # Arguments
/// * `answers` - The questionnaire answers; a missing or non-object body counts as no answers
///
/// # Errors
/// Returns `400 Bad Request` when answers are missing or a required answer is absent, or
/// `500 Internal Server Error` if fetching candidate trials fails.
#[axum::debug_handler]
pub async fn assess(
    State(state): State<AppState>,
    answers: Option<Json<Answers>>,
) -> Result<Json<AssessRes>, ApiError> {
    let context = "Failed to process eligibility assessment";
    let Some(Json(answers)) = answers else {
        return Err(ApiError::new(context, TrialsError::MissingAnswers));
    };

    let result = state
        .service
        .assess(answers)
        .await
        .map_err(|e| ApiError::new(context, e))?;
    Ok(Json(AssessRes {
        success: true,
        message: "Eligibility assessment completed successfully".into(),
        assessment_id: result.id.to_string(),
        result,
    }))
}

#[utoipa::path(
    get,
    path = "/api/eligibility/assessment/{id}",
    params(("id" = String, Path, description = "Assessment ID returned by the assess call")),
    responses(
        (status = 200, description = "Stored assessment", body = AssessmentRecord),
        (status = 400, description = "Malformed assessment ID", body = api_shared::ErrorRes),
        (status = 404, description = "Unknown or expired assessment", body = api_shared::ErrorRes)
    )
)]
/// A stored assessment
///
/// # Errors
/// Returns `400 Bad Request` for a malformed ID or `404 Not Found` when the assessment is unknown
/// or has expired.
#[axum::debug_handler]
pub async fn assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentRecord>, ApiError> {
    state
        .service
        .assessment(&id)
        .map(Json)
        .map_err(|e| ApiError::new("Failed to load assessment", e))
}

#[utoipa::path(
    get,
    path = "/api/eligibility/insights/{id}",
    params(("id" = String, Path, description = "Assessment ID returned by the assess call")),
    responses(
        (status = 200, description = "Enhanced insights", body = InsightsRes),
        (status = 400, description = "Malformed assessment ID", body = api_shared::ErrorRes),
        (status = 404, description = "Unknown or expired assessment", body = api_shared::ErrorRes)
    )
)]
/// Enhanced insights for a stored assessment
///
/// # Errors
/// Same as the assessment lookup.
#[axum::debug_handler]
pub async fn insights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InsightsRes>, ApiError> {
    let insights = state
        .service
        .insights(&id)
        .map_err(|e| ApiError::new("Internal server error while generating enhanced insights", e))?;
    Ok(Json(InsightsRes {
        success: true,
        assessment_id: id,
        insights,
        last_updated: Utc::now(),
    }))
}
