//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ServiceError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Service-layer error, mapped by variant
    Service(ServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Service(err) => service_error_response(err),
        };

        (status, Json(error)).into_response()
    }
}

fn service_error_response(err: ServiceError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        ServiceError::Engine(_) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_VIEW", message),
        ),
        ServiceError::GroupNotFound { .. } | ServiceError::RecordNotFound { .. } => {
            (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
        }
        ServiceError::Repository(repo) => {
            let details = repo.context().to_string();
            let (status, code) = match repo {
                RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                RepositoryError::ValidationError { .. } => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                }
                RepositoryError::InternalError { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
                }
            };
            (status, ApiError::new(code, repo.message()).with_details(details))
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Service(ServiceError::Repository(err))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DatasetId;
    use crate::engine::EngineError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ServiceError::Engine(EngineError::UnknownGrouping("x".into())).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RepositoryError::not_found("Dataset 1 not found").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::validation("empty name").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                ServiceError::RecordNotFound {
                    dataset_id: DatasetId::new(1),
                    index: 9
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(RepositoryError::internal("boom").into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
