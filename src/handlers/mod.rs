pub mod health_handlers;
pub mod scan_handlers;
pub mod schedule_handlers;

pub use health_handlers::{health_check, liveness_check};
pub use scan_handlers::{cancel_scan, create_scan, get_scan, list_scans};
pub use schedule_handlers::{create_schedule, get_schedule, list_schedules, update_schedule};

use axum::extract::rejection::JsonRejection;

use crate::error::ApiError;

/// Malformed or mistyped JSON bodies become a 400 in the API error shape
pub(crate) fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
}
