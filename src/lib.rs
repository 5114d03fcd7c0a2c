use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    repositories::{
        InMemoryScanJobRepository, InMemoryScheduledScanRepository, ScanJobRepository,
        ScheduledScanRepository,
    },
    services::{CheckRegistry, ScanOrchestrator, ScheduleService, TaskManager},
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub scan_orchestrator: Arc<ScanOrchestrator>,
    pub schedule_service: Arc<ScheduleService>,
    pub task_manager: Arc<TaskManager>,
}

impl AppState {
    /// Wire in-memory stores and the default checks
    pub fn new(config: Settings) -> Self {
        Self::with_registry(config, CheckRegistry::with_default_checks())
    }

    /// Same as `new` with a caller-provided set of checks
    pub fn with_registry(config: Settings, registry: CheckRegistry) -> Self {
        let config = Arc::new(config);

        let job_repository: Arc<dyn ScanJobRepository + Send + Sync> = Arc::new(
            InMemoryScanJobRepository::new(config.job_retention_limit as usize),
        );
        let schedule_repository: Arc<dyn ScheduledScanRepository + Send + Sync> =
            Arc::new(InMemoryScheduledScanRepository::new());

        let task_manager = Arc::new(TaskManager::new(config.max_concurrent_scans as usize));
        let scan_orchestrator = Arc::new(ScanOrchestrator::new(
            job_repository,
            Arc::new(registry),
            Arc::clone(&task_manager),
        ));
        let schedule_service = Arc::new(ScheduleService::new(schedule_repository));

        Self {
            config,
            scan_orchestrator,
            schedule_service,
            task_manager,
        }
    }
}

/// API routes with application state, before the cross-cutting layers
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/live", get(handlers::liveness_check))
        .route(
            "/api/scans",
            post(handlers::create_scan).get(handlers::list_scans),
        )
        .route(
            "/api/scans/:id",
            get(handlers::get_scan).delete(handlers::cancel_scan),
        )
        .route(
            "/api/schedules",
            post(handlers::create_schedule).get(handlers::list_schedules),
        )
        .route(
            "/api/schedules/:id",
            get(handlers::get_schedule).patch(handlers::update_schedule),
        )
        .with_state(app_state)
}
