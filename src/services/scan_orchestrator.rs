//! Scan Orchestrator
//!
//! Owns the lifecycle of scan jobs:
//! 1. A job is validated and stored as PENDING
//! 2. Execution is handed to the task manager and waits for a worker slot
//! 3. The checks for the scan type run in order while progress is reported
//! 4. Findings of failing checks are aggregated into the scan result
//! 5. The job ends COMPLETED, FAILED or CANCELLED; the first terminal state wins

use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::ScanError,
    models::{
        JobStatistics, ScanJob, ScanJobCreate, ScanOptions, ScanResult, ScanStats, ScanStatus,
        ScanType, SCANNER_NAME, SCANNER_VERSION,
    },
    repositories::ScanJobRepository,
    services::{check_registry::CheckRegistry, task_manager::TaskManager},
    utils::{generate_id, validate_name, validate_target_url},
};

/// Progress reached once every check has run, before the result is stored
const CHECKS_DONE_PROGRESS: u8 = 90;

#[derive(Clone)]
pub struct ScanOrchestrator {
    job_repo: Arc<dyn ScanJobRepository + Send + Sync>,
    registry: Arc<CheckRegistry>,
    task_manager: Arc<TaskManager>,
}

impl ScanOrchestrator {
    pub fn new(
        job_repo: Arc<dyn ScanJobRepository + Send + Sync>,
        registry: Arc<CheckRegistry>,
        task_manager: Arc<TaskManager>,
    ) -> Self {
        Self {
            job_repo,
            registry,
            task_manager,
        }
    }

    // ========================================================================
    // JOB MANAGEMENT
    // ========================================================================

    /// Validate the request and store a PENDING job. Nothing is stored when
    /// validation fails.
    pub async fn create_job(&self, request: ScanJobCreate) -> Result<ScanJob, ScanError> {
        let scan_type = match request.scan_type.as_deref() {
            None => ScanType::default(),
            Some(raw) => raw.parse::<ScanType>()?,
        };
        validate_name(&request.name)?;
        validate_target_url(&request.target.url)?;

        let job = ScanJob::new(
            generate_id("scan"),
            request.name.trim().to_string(),
            scan_type,
            request.target,
            request.options,
        );
        let job = self.job_repo.create(job).await?;

        tracing::info!(
            job_id = %job.id,
            scan_type = %job.scan_type,
            target = %job.target.url,
            "created scan job"
        );
        Ok(job)
    }

    /// Queue execution in the background. Outcomes are logged, never returned.
    pub async fn submit(&self, job_id: &str) {
        let orchestrator = self.clone();
        let id = job_id.to_string();

        self.task_manager
            .submit(job_id.to_string(), async move {
                match orchestrator.execute(&id).await {
                    Ok(result) => tracing::info!(
                        job_id = %id,
                        findings = result.stats.vulnerabilities_found,
                        duration = result.duration,
                        "scan job completed"
                    ),
                    Err(ScanError::Cancelled(_)) => {
                        tracing::info!(job_id = %id, "scan job stopped after cancellation")
                    }
                    Err(e) => tracing::warn!(job_id = %id, error = %e, "scan job did not complete"),
                }
            })
            .await;
    }

    pub async fn get_job(&self, job_id: &str) -> Result<ScanJob, ScanError> {
        self.job_repo
            .get_by_id(job_id)
            .await?
            .ok_or_else(|| ScanError::JobNotFound(job_id.to_string()))
    }

    pub async fn list_jobs(&self) -> Result<Vec<ScanJob>, ScanError> {
        self.job_repo.list_all().await
    }

    pub async fn statistics(&self) -> Result<JobStatistics, ScanError> {
        self.job_repo.count_by_status().await
    }

    /// Cancel a pending or running job. Finished jobs are returned unchanged.
    pub async fn cancel(&self, job_id: &str) -> Result<ScanJob, ScanError> {
        let job = self.job_repo.cancel(job_id).await?;
        tracing::info!(job_id = %job.id, status = %job.status, "cancel requested for scan job");
        Ok(job)
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Run every check of the job's scan type and store the outcome
    pub async fn execute(&self, job_id: &str) -> Result<ScanResult, ScanError> {
        let job = self
            .job_repo
            .start(job_id)
            .await
            .map_err(|e| cancelled_or(e, job_id))?;
        let clock = Instant::now();
        let started_at = job.started_at.unwrap_or_else(Utc::now);

        tracing::info!(job_id = %job_id, scan_type = %job.scan_type, "scan job started");

        let checks = match self.registry.resolve(job.scan_type) {
            Ok(checks) => checks,
            Err(e) => return Err(self.record_failure(job_id, e.to_string(), e).await),
        };

        let options = ScanOptions::resolve(job.options.as_ref());
        let initial_progress = job.scan_type.initial_progress();
        self.report_progress(job_id, initial_progress).await?;

        let total = checks.len();
        let mut findings = Vec::new();
        let mut errors = Vec::new();
        let mut stats = ScanStats::default();

        for (index, (kind, check)) in checks.into_iter().enumerate() {
            self.ensure_not_cancelled(job_id).await?;
            tracing::debug!(job_id = %job_id, check = %kind, "running security check");

            let outcome = AssertUnwindSafe(check.run(&job.target, &options))
                .catch_unwind()
                .await;

            let mut report = match outcome {
                Ok(Ok(report)) => report,
                Ok(Err(err)) => {
                    return Err(self.record_check_failure(job_id, check.name(), err.to_string()).await)
                }
                Err(panic) => {
                    let message = format!("panicked: {}", panic_message(panic));
                    return Err(self.record_check_failure(job_id, check.name(), message).await);
                }
            };

            stats.requests_made += report.requests_made;
            stats.endpoints_scanned += report.endpoints_scanned;
            errors.extend(
                report
                    .errors
                    .drain(..)
                    .map(|error| format!("{}: {}", check.name(), error)),
            );
            findings.extend(report.into_findings());

            let step = usize::from(CHECKS_DONE_PROGRESS - initial_progress) * (index + 1) / total;
            self.report_progress(job_id, initial_progress + step as u8).await?;
        }

        stats.vulnerabilities_found = findings.len() as u32;
        let result = ScanResult {
            scanner: SCANNER_NAME.to_string(),
            version: Some(SCANNER_VERSION.to_string()),
            started_at,
            completed_at: Utc::now(),
            duration: clock.elapsed().as_secs_f64().round() as u64,
            findings,
            errors,
            stats,
        };

        self.job_repo
            .complete(job_id, result.clone())
            .await
            .map_err(|e| interrupted(e, job_id))?;

        Ok(result)
    }

    async fn ensure_not_cancelled(&self, job_id: &str) -> Result<(), ScanError> {
        match self.job_repo.get_by_id(job_id).await? {
            Some(job) if job.status == ScanStatus::Cancelled => {
                Err(ScanError::Cancelled(job_id.to_string()))
            }
            Some(_) => Ok(()),
            None => Err(ScanError::Cancelled(job_id.to_string())),
        }
    }

    async fn report_progress(&self, job_id: &str, progress: u8) -> Result<(), ScanError> {
        self.job_repo
            .update_progress(job_id, progress)
            .await
            .map(|_| ())
            .map_err(|e| interrupted(e, job_id))
    }

    async fn record_check_failure(&self, job_id: &str, check: &str, message: String) -> ScanError {
        let failure = ScanError::CheckExecutionFailure {
            check: check.to_string(),
            message: message.clone(),
        };
        self.record_failure(job_id, format!("{}: {}", check, message), failure)
            .await
    }

    /// Mark the job FAILED and hand back `cause`, unless a cancel got there first
    async fn record_failure(&self, job_id: &str, error: String, cause: ScanError) -> ScanError {
        match self.job_repo.fail(job_id, error.clone()).await {
            Ok(_) => {
                tracing::warn!(job_id = %job_id, error = %error, "scan job failed");
                cause
            }
            Err(e) => interrupted(e, job_id),
        }
    }
}

/// A transition rejected because the job was cancelled becomes `Cancelled`
fn cancelled_or(err: ScanError, job_id: &str) -> ScanError {
    match err {
        ScanError::InvalidTransition {
            from: ScanStatus::Cancelled,
            ..
        } => ScanError::Cancelled(job_id.to_string()),
        other => other,
    }
}

/// Once a job is running only a cancel ends it early, and retention may have
/// dropped the cancelled record since
fn interrupted(err: ScanError, job_id: &str) -> ScanError {
    match err {
        ScanError::JobNotFound(_) => ScanError::Cancelled(job_id.to_string()),
        other => cancelled_or(other, job_id),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
