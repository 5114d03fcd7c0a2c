use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::{error::ApiError, AppState};

/// GET /api/health - Service status with job and worker pool counts
pub async fn health_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let jobs = app_state.scan_orchestrator.statistics().await?;
    let workers = app_state.task_manager.statistics().await;

    Ok(Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "novacore-backend",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "jobs": jobs,
        "workers": workers
    })))
}

/// GET /api/health/live
pub async fn liveness_check() -> Json<Value> {
    Json(json!({
        "alive": true,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
