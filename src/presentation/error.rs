use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::RepositoryError;
use crate::application::services::RelayError;

/// Everything a handler can answer with, mapped onto the wire taxonomy.
/// Ownership mismatches arrive here already collapsed into `NotFound`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub r#type: &'static str,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) | ApiError::PersistenceFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request_error",
            ApiError::Unauthorized => "unauthorized",
            ApiError::NotFound => "not_found",
            ApiError::UpstreamUnavailable(_) => "api_error",
            ApiError::PersistenceFailure(_) => "storage_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                message: self.to_string(),
                r#type: self.error_type(),
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound,
            other => ApiError::PersistenceFailure(other.to_string()),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            RelayError::UpstreamUnavailable(msg) => ApiError::UpstreamUnavailable(msg),
        }
    }
}
