use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    handlers::invalid_body,
    models::{ScanTarget, ScheduledScanCreate, TargetType},
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub name: Option<String>,
    pub target_url: Option<String>,
    #[serde(rename = "type")]
    pub scan_type: Option<String>,
    pub target_type: Option<TargetType>,
    pub cron_expression: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub enabled: bool,
}

/// POST /api/schedules - Register a recurring scan definition
pub async fn create_schedule(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;

    let (name, target_url, cron_expression) =
        match (payload.name, payload.target_url, payload.cron_expression) {
            (Some(name), Some(target_url), Some(cron)) => (name, target_url, cron),
            _ => {
                return Err(ApiError::validation(
                    "Missing required fields: name, targetUrl, cronExpression",
                ))
            }
        };

    let request = ScheduledScanCreate {
        name,
        scan_type: payload.scan_type.filter(|t| !t.is_empty()),
        target: ScanTarget {
            target_type: payload.target_type.unwrap_or_default(),
            ..ScanTarget::new(target_url)
        },
        cron_expression,
    };

    let schedule = app_state.schedule_service.create_schedule(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": schedule,
            "message": "Schedule created successfully"
        })),
    ))
}

/// GET /api/schedules
pub async fn list_schedules(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let schedules = app_state.schedule_service.list_schedules().await?;
    Ok(Json(json!({
        "success": true,
        "data": schedules,
        "meta": { "total": schedules.len() }
    })))
}

/// GET /api/schedules/:id
pub async fn get_schedule(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let schedule = app_state.schedule_service.get_schedule(&id).await?;
    Ok(Json(json!({ "success": true, "data": schedule })))
}

/// PATCH /api/schedules/:id - Enable or disable a schedule
pub async fn update_schedule(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateScheduleRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let schedule = app_state
        .schedule_service
        .set_enabled(&id, payload.enabled)
        .await?;
    Ok(Json(json!({ "success": true, "data": schedule })))
}
