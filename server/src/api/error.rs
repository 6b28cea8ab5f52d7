//! API error type and its mapping onto HTTP statuses and envelope codes.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use lexpipe::model::ProcessingStatus;
use lexpipe::{ProcessingError, UploadError};

use super::response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    RetryNotAllowed(String),
    #[error("{0}")]
    CancelNotAllowed(String),
    #[error("Processing not yet completed")]
    ResultNotReady {
        status: ProcessingStatus,
        progress: u8,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payload attached to `RESULT_NOT_READY` responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub status: ProcessingStatus,
    pub progress: u8,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::RetryNotAllowed(detail) => {
                (StatusCode::BAD_REQUEST, "RETRY_NOT_ALLOWED", detail.clone())
            }
            ApiError::CancelNotAllowed(detail) => {
                (StatusCode::BAD_REQUEST, "CANCEL_NOT_ALLOWED", detail.clone())
            }
            ApiError::ResultNotReady { status, progress } => {
                let body = ApiResponse::err_with(
                    "RESULT_NOT_READY",
                    self.to_string(),
                    RunState {
                        status: *status,
                        progress: *progress,
                    },
                );
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<()>::err(code, message))).into_response()
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            ProcessingError::RetryNotAllowed { .. } => ApiError::RetryNotAllowed(err.to_string()),
            ProcessingError::CancelNotAllowed { .. } => {
                ApiError::CancelNotAllowed(err.to_string())
            }
            ProcessingError::ResultNotReady { status, progress } => {
                ApiError::ResultNotReady { status, progress }
            }
            ProcessingError::InvalidRequest(message) => ApiError::BadRequest(message),
            ProcessingError::AlreadyExists(_)
            | ProcessingError::Superseded { .. }
            | ProcessingError::Dispatch(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidArchive(_) | UploadError::UnsupportedFormat(_) => {
                ApiError::BadRequest(err.to_string())
            }
            UploadError::Storage(_) | UploadError::Task(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::BadRequest("File too large".to_string())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
