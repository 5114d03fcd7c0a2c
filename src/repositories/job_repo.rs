use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::{
    error::ScanError,
    models::{JobStatistics, ScanJob, ScanResult},
};

#[async_trait]
pub trait ScanJobRepository {
    async fn create(&self, job: ScanJob) -> Result<ScanJob, ScanError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<ScanJob>, ScanError>;
    async fn list_all(&self) -> Result<Vec<ScanJob>, ScanError>;
    async fn start(&self, id: &str) -> Result<ScanJob, ScanError>;
    async fn update_progress(&self, id: &str, progress: u8) -> Result<ScanJob, ScanError>;
    async fn complete(&self, id: &str, result: ScanResult) -> Result<ScanJob, ScanError>;
    async fn fail(&self, id: &str, error: String) -> Result<ScanJob, ScanError>;
    /// Cancelling a job that already finished returns it unchanged
    async fn cancel(&self, id: &str) -> Result<ScanJob, ScanError>;
    async fn count_by_status(&self) -> Result<JobStatistics, ScanError>;
}

#[derive(Default)]
struct JobTable {
    jobs: HashMap<String, ScanJob>,
    order: VecDeque<String>,
}

impl JobTable {
    /// Drop the oldest finished jobs until the table fits `limit`
    fn evict_finished(&mut self, limit: usize) -> usize {
        let mut excess = self.jobs.len().saturating_sub(limit);
        if limit == 0 || excess == 0 {
            return 0;
        }

        let jobs = &mut self.jobs;
        let mut evicted = 0;
        self.order.retain(|id| {
            if excess == 0 {
                return true;
            }
            let finished = jobs.get(id).map_or(false, |job| job.status.is_terminal());
            if finished {
                jobs.remove(id);
                excess -= 1;
                evicted += 1;
            }
            !finished
        });
        evicted
    }
}

/// Process-local job store. Every transition is a read-modify-write under a
/// single write lock, so concurrent transitions on one job serialize.
pub struct InMemoryScanJobRepository {
    table: RwLock<JobTable>,
    retention_limit: usize,
}

impl InMemoryScanJobRepository {
    /// `retention_limit` of 0 keeps every job
    pub fn new(retention_limit: usize) -> Self {
        Self {
            table: RwLock::new(JobTable::default()),
            retention_limit,
        }
    }

    async fn transition<F>(&self, id: &str, apply: F) -> Result<ScanJob, ScanError>
    where
        F: FnOnce(&mut ScanJob) -> Result<(), ScanError> + Send,
    {
        let mut table = self.table.write().await;
        let stored = table
            .jobs
            .get_mut(id)
            .ok_or_else(|| ScanError::JobNotFound(id.to_string()))?;

        // Work on a copy so a rejected transition leaves the record as it was
        let mut updated = stored.clone();
        apply(&mut updated)?;
        *stored = updated.clone();
        Ok(updated)
    }
}

impl Default for InMemoryScanJobRepository {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ScanJobRepository for InMemoryScanJobRepository {
    async fn create(&self, job: ScanJob) -> Result<ScanJob, ScanError> {
        let mut table = self.table.write().await;
        if table.jobs.contains_key(&job.id) {
            return Err(ScanError::DuplicateId(job.id));
        }

        table.order.push_back(job.id.clone());
        table.jobs.insert(job.id.clone(), job.clone());

        let evicted = table.evict_finished(self.retention_limit);
        if evicted > 0 {
            tracing::debug!(evicted, retained = table.jobs.len(), "evicted finished scan jobs");
        }

        Ok(job)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ScanJob>, ScanError> {
        Ok(self.table.read().await.jobs.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ScanJob>, ScanError> {
        let table = self.table.read().await;
        Ok(table
            .order
            .iter()
            .filter_map(|id| table.jobs.get(id).cloned())
            .collect())
    }

    async fn start(&self, id: &str) -> Result<ScanJob, ScanError> {
        self.transition(id, |job| job.start()).await
    }

    async fn update_progress(&self, id: &str, progress: u8) -> Result<ScanJob, ScanError> {
        self.transition(id, |job| job.advance_progress(progress)).await
    }

    async fn complete(&self, id: &str, result: ScanResult) -> Result<ScanJob, ScanError> {
        self.transition(id, move |job| job.complete(result)).await
    }

    async fn fail(&self, id: &str, error: String) -> Result<ScanJob, ScanError> {
        self.transition(id, move |job| job.fail(error)).await
    }

    async fn cancel(&self, id: &str) -> Result<ScanJob, ScanError> {
        self.transition(id, |job| {
            job.cancel();
            Ok(())
        })
        .await
    }

    async fn count_by_status(&self) -> Result<JobStatistics, ScanError> {
        let table = self.table.read().await;
        let mut stats = JobStatistics::default();
        for job in table.jobs.values() {
            stats.record(job.status);
        }
        Ok(stats)
    }
}
