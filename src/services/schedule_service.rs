use std::sync::Arc;

use crate::{
    error::ScanError,
    models::{ScanType, ScheduledScan, ScheduledScanCreate},
    repositories::ScheduledScanRepository,
    utils::{generate_id, validate_cron_expression, validate_name, validate_target_url},
};

/// Stores recurring scan definitions. Nothing triggers them on a timer.
#[derive(Clone)]
pub struct ScheduleService {
    schedule_repo: Arc<dyn ScheduledScanRepository + Send + Sync>,
}

impl ScheduleService {
    pub fn new(schedule_repo: Arc<dyn ScheduledScanRepository + Send + Sync>) -> Self {
        Self { schedule_repo }
    }

    pub async fn create_schedule(
        &self,
        request: ScheduledScanCreate,
    ) -> Result<ScheduledScan, ScanError> {
        let scan_type = match request.scan_type.as_deref() {
            None => ScanType::default(),
            Some(raw) => raw.parse::<ScanType>()?,
        };
        validate_name(&request.name)?;
        validate_target_url(&request.target.url)?;
        validate_cron_expression(&request.cron_expression)?;

        let schedule = ScheduledScan {
            id: generate_id("schedule"),
            name: request.name.trim().to_string(),
            scan_type,
            target: request.target,
            cron_expression: request.cron_expression.trim().to_string(),
            enabled: true,
            last_run: None,
            next_run: None,
        };
        let schedule = self.schedule_repo.create(schedule).await?;

        tracing::info!(
            schedule_id = %schedule.id,
            scan_type = %schedule.scan_type,
            cron = %schedule.cron_expression,
            "created scheduled scan"
        );
        Ok(schedule)
    }

    pub async fn list_schedules(&self) -> Result<Vec<ScheduledScan>, ScanError> {
        self.schedule_repo.list_all().await
    }

    pub async fn get_schedule(&self, id: &str) -> Result<ScheduledScan, ScanError> {
        self.schedule_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ScanError::ScheduleNotFound(id.to_string()))
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<ScheduledScan, ScanError> {
        let schedule = self.schedule_repo.set_enabled(id, enabled).await?;
        tracing::info!(schedule_id = %id, enabled, "updated scheduled scan");
        Ok(schedule)
    }
}
