use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::models::{CheckKind, ScanStatus, ScanType};

/// Errors raised by the scan orchestrator, job store and scheduler
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid scan type '{0}'")]
    InvalidScanType(String),

    #[error("Invalid scan target: {0}")]
    InvalidTarget(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scan job {0} not found")]
    JobNotFound(String),

    #[error("Scheduled scan {0} not found")]
    ScheduleNotFound(String),

    #[error("Duplicate identifier {0}")]
    DuplicateId(String),

    #[error("Scan job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: ScanStatus,
        to: ScanStatus,
    },

    #[error("Scan job {0} was cancelled")]
    Cancelled(String),

    #[error("No check registered for {0}")]
    CheckNotRegistered(CheckKind),

    #[error("Check {check} failed: {message}")]
    CheckExecutionFailure { check: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict error: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a new validation error
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidScanType(ref value) => ApiError::Validation(format!(
                "Invalid type '{}'. Must be one of: {}",
                value,
                ScanType::valid_values()
            )),
            ScanError::InvalidTarget(_)
            | ScanError::InvalidSchedule(_)
            | ScanError::Validation(_) => ApiError::Validation(err.to_string()),
            ScanError::JobNotFound(_) | ScanError::ScheduleNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ScanError::InvalidTransition { .. } | ScanError::Cancelled(_) => {
                ApiError::Conflict(err.to_string())
            }
            ScanError::DuplicateId(_)
            | ScanError::CheckNotRegistered(_)
            | ScanError::CheckExecutionFailure { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status_code();

        let (error_message, error_code) = match &self {
            ApiError::Validation(msg) => {
                tracing::warn!(error_id = %error_id, error = %msg, "validation error occurred");
                (msg.clone(), "VALIDATION_ERROR")
            }
            ApiError::NotFound(msg) => {
                tracing::info!(error_id = %error_id, error = %msg, "resource not found");
                (msg.clone(), "NOT_FOUND")
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(error_id = %error_id, error = %msg, "conflict error occurred");
                (msg.clone(), "CONFLICT_ERROR")
            }
            ApiError::Internal(msg) => {
                tracing::error!(error_id = %error_id, error = %msg, "internal server error occurred");
                (msg.clone(), "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "message": error_message,
                "code": error_code,
                "error_id": error_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}
