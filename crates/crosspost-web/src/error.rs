//! Error types for the HTTP API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crosspost_publish::DispatchError;
use crosspost_scheduler::{PipelineError, SchedulerError};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// Scheduler rejected the operation.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Content could not be prepared.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Scheduler(SchedulerError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Scheduler(SchedulerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Scheduler(SchedulerError::StateConflict { .. }) => StatusCode::CONFLICT,
            ApiError::Pipeline(PipelineError::Dispatch(DispatchError::Validation(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Pipeline(PipelineError::Source(_) | PipelineError::Translate(_)) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "request failed upstream");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_content::SourceError;
    use crosspost_scheduler::{JobId, JobStatus};

    #[test]
    fn test_status_mapping() {
        let id = JobId::new_v4();
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                SchedulerError::Validation("x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (SchedulerError::NotFound(id).into(), StatusCode::NOT_FOUND),
            (
                SchedulerError::StateConflict {
                    id,
                    status: JobStatus::Running,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (
                PipelineError::from(SourceError::InvalidResponse("x".into())).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PipelineError::from(DispatchError::Validation("x".into())).into(),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{}", error);
        }
    }
}
