use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::{
    error::ApiError,
    handlers::invalid_body,
    models::{
        ScanAuth, ScanJobCreate, ScanJobCreatedResponse, ScanJobDetailResponse, ScanJobSummary,
        ScanOptions, ScanStatus, ScanTarget, TargetType,
    },
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScanRequest {
    pub name: Option<String>,
    pub target_url: Option<String>,
    #[serde(rename = "type")]
    pub scan_type: Option<String>,
    pub target_type: Option<TargetType>,
    pub auth: Option<ScanAuth>,
    pub headers: Option<HashMap<String, String>>,
    pub options: Option<ScanOptions>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/scans - Create a scan job and start it in the background
pub async fn create_scan(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateScanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload.map_err(invalid_body)?;

    let (name, target_url) = match (non_blank(payload.name), non_blank(payload.target_url)) {
        (Some(name), Some(target_url)) => (name, target_url),
        _ => return Err(ApiError::validation("Missing required fields: name, targetUrl")),
    };

    let request = ScanJobCreate {
        name,
        scan_type: payload.scan_type.filter(|t| !t.is_empty()),
        target: ScanTarget {
            url: target_url,
            target_type: payload.target_type.unwrap_or_default(),
            auth: payload.auth,
            headers: payload.headers,
        },
        options: payload.options,
    };

    let job = app_state.scan_orchestrator.create_job(request).await?;
    app_state.scan_orchestrator.submit(&job.id).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": ScanJobCreatedResponse::from(&job),
            "message": "Scan started successfully"
        })),
    ))
}

/// GET /api/scans - List every scan job in creation order
pub async fn list_scans(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let jobs = app_state.scan_orchestrator.list_jobs().await?;

    let running = jobs.iter().filter(|j| j.status == ScanStatus::Running).count();
    let completed = jobs.iter().filter(|j| j.status == ScanStatus::Completed).count();
    let data: Vec<ScanJobSummary> = jobs.iter().map(ScanJobSummary::from).collect();

    Ok(Json(json!({
        "success": true,
        "data": data,
        "meta": {
            "total": jobs.len(),
            "running": running,
            "completed": completed
        }
    })))
}

/// GET /api/scans/:id - Job detail including the result once completed
pub async fn get_scan(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let job = app_state.scan_orchestrator.get_job(&id).await?;
    Ok(Json(json!({
        "success": true,
        "data": ScanJobDetailResponse::from(job)
    })))
}

/// DELETE /api/scans/:id - Cancel a pending or running scan
pub async fn cancel_scan(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let job = app_state.scan_orchestrator.cancel(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Scan cancelled",
        "data": {
            "id": job.id,
            "status": job.status
        }
    })))
}
