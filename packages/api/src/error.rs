// ABOUTME: API error type and its HTTP mapping
// ABOUTME: Turns task, storage and request errors into status codes with machine-readable codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use tasklane_storage::StorageError;
use tasklane_tasks::TaskError;

/// Error type returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    message: String,
    code: &'static str,
    request_id: String,
}

fn storage_status(err: &StorageError) -> (StatusCode, &'static str) {
    match err {
        StorageError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        StorageError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        StorageError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
    }
}

fn storage_message(err: &StorageError) -> String {
    match err {
        StorageError::NotFound => "Resource not found".to_string(),
        StorageError::InvalidInput(msg) | StorageError::Conflict(msg) => msg.clone(),
        _ => "Data storage error".to_string(),
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    /// HTTP status and machine-readable code
    pub fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Storage(err) => storage_status(err),
            ApiError::Task(task_error) => match task_error {
                TaskError::UnsupportedFormat { .. } => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT")
                }
                TaskError::NoEligibleAssignees => {
                    (StatusCode::BAD_REQUEST, "NO_ELIGIBLE_ASSIGNEES")
                }
                TaskError::MissingTitle => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                TaskError::DuplicateTask { .. } => (StatusCode::CONFLICT, "DUPLICATE_TASK"),
                TaskError::ConfirmationRequired => {
                    (StatusCode::BAD_REQUEST, "CONFIRMATION_REQUIRED")
                }
                TaskError::CreatorNotFound(_) | TaskError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND")
                }
                TaskError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                TaskError::InvalidAssignment => (StatusCode::BAD_REQUEST, "INVALID_ASSIGNMENT"),
                TaskError::Parse(_) => (StatusCode::BAD_REQUEST, "PARSE_ERROR"),
                TaskError::Internal(_) | TaskError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
                TaskError::Storage(err) => storage_status(err),
            },
        }
    }

    /// Message safe to show to the caller
    fn to_user_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Unauthorized => "Authentication required".to_string(),
            ApiError::Forbidden { message } => message.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(_) => "An internal server error occurred".to_string(),
            ApiError::Storage(err) => storage_message(err),
            ApiError::Task(task_error) => match task_error {
                TaskError::Internal(_) | TaskError::Io(_) => {
                    "An internal server error occurred".to_string()
                }
                TaskError::Storage(err) => storage_message(err),
                other => other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status_code, error_code) = self.to_status_and_code();

        if status_code.is_server_error() {
            error!(
                request_id = %request_id,
                error = %self,
                detail = ?self,
                "Internal server error occurred"
            );
        } else {
            info!(
                request_id = %request_id,
                error_code = %error_code,
                error = %self,
                "API error response"
            );
        }

        let body = ErrorResponse {
            success: false,
            message: self.to_user_message(),
            code: error_code,
            request_id,
        };

        (status_code, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
