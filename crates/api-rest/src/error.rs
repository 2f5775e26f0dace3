//! Mapping from [`TrialsError`] to HTTP responses.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use trials_core::TrialsError;

/// A failed handler: the core error plus the summary shown when the failure is internal.
#[derive(Debug)]
pub struct ApiError {
    context: &'static str,
    source: TrialsError,
}

impl ApiError {
    pub fn new(context: &'static str, source: TrialsError) -> Self {
        Self { context, source }
    }

    pub fn status(&self) -> StatusCode {
        if self.source.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.source.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn body(&self) -> ErrorRes {
        match &self.source {
            TrialsError::MissingAnswers => ErrorRes::new("Assessment answers are required")
                .with_message("Please provide answers to the eligibility questions"),
            TrialsError::MissingFields(fields) => ErrorRes::new("Missing required fields")
                .with_message(format!(
                    "Please answer all required questions: {}",
                    fields.join(", ")
                ))
                .with_missing_fields(fields.clone()),
            TrialsError::InvalidInput(msg) => {
                ErrorRes::new("Invalid request").with_message(msg.clone())
            }
            TrialsError::TrialNotFound(id) => ErrorRes::new("Trial not found")
                .with_message(format!("No clinical trial found with ID: {id}")),
            TrialsError::AssessmentNotFound(_) => ErrorRes::new("Assessment not found"),
            TrialsError::Upstream(_) | TrialsError::QuestionCatalogue(_) => {
                ErrorRes::new(self.context).with_message(self.source.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{} error: {:?}", self.context, self.source);
        } else {
            tracing::debug!(status = status.as_u16(), "{}: {}", self.context, self.source);
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let bad = ApiError::new("x", TrialsError::MissingFields(vec!["age".into()]));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.body().missing_fields, vec!["age"]);

        let missing = ApiError::new("x", TrialsError::TrialNotFound("NCT1".into()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let upstream = ApiError::new(
            "Failed to search trials",
            ctgov::CtGovError::Status {
                status: 502,
                body: String::new(),
            }
            .into(),
        );
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.body().error, "Failed to search trials");
    }
}
