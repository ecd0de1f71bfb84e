use std::fmt;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::coordinator::CoordinatorError;
use crate::directory::DirectoryError;
use crate::ledger::LedgerError;
use crate::storage::StorageError;

/// Machine-readable error code carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    InvalidStateTransition,
    NoWorkAvailable,
    UpstreamUnavailable,
    PayloadTooLarge,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::NoWorkAvailable => "NO_WORK_AVAILABLE",
            ErrorCode::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("no work available")]
    NoWorkAvailable,
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn payload_too_large(limit: usize) -> Self {
        ApiError::PayloadTooLarge(format!("payload exceeds {} bytes", limit))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::NoWorkAvailable => StatusCode::NOT_FOUND,
            ApiError::InvalidStateTransition(_) => StatusCode::CONFLICT,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidInput(_) => ErrorCode::InvalidInput,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::InvalidStateTransition(_) => ErrorCode::InvalidStateTransition,
            ApiError::NoWorkAvailable => ErrorCode::NoWorkAvailable,
            ApiError::UpstreamUnavailable(_) => ErrorCode::UpstreamUnavailable,
            ApiError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => ApiError::NotFound(err.to_string()),
            LedgerError::InvalidStateTransition(_) => ApiError::InvalidStateTransition(err.to_string()),
            LedgerError::NoWorkAvailable => ApiError::NoWorkAvailable,
            LedgerError::Unavailable(reason) => ApiError::UpstreamUnavailable(reason),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StorageError::InvalidStage(_) => ApiError::InvalidInput(err.to_string()),
            StorageError::Unavailable(reason) => ApiError::UpstreamUnavailable(reason),
            StorageError::ObjectStoreError(_) | StorageError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::InvalidInput(reason) => ApiError::InvalidInput(reason),
            CoordinatorError::PayloadTooLarge(reason) => ApiError::PayloadTooLarge(reason),
            CoordinatorError::Ledger(err) => err.into(),
            CoordinatorError::Storage(err) => err.into(),
            CoordinatorError::UpstreamUnavailable(reason) => ApiError::UpstreamUnavailable(reason),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::InvalidInput(reason) => ApiError::InvalidInput(reason),
            DirectoryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DirectoryError::Unavailable(reason) => ApiError::UpstreamUnavailable(reason),
        }
    }
}
