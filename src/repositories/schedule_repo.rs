use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{error::ScanError, models::ScheduledScan};

#[async_trait]
pub trait ScheduledScanRepository {
    async fn create(&self, schedule: ScheduledScan) -> Result<ScheduledScan, ScanError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<ScheduledScan>, ScanError>;
    async fn list_all(&self) -> Result<Vec<ScheduledScan>, ScanError>;
    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<ScheduledScan, ScanError>;
}

#[derive(Default)]
pub struct InMemoryScheduledScanRepository {
    schedules: RwLock<(HashMap<String, ScheduledScan>, Vec<String>)>,
}

impl InMemoryScheduledScanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduledScanRepository for InMemoryScheduledScanRepository {
    async fn create(&self, schedule: ScheduledScan) -> Result<ScheduledScan, ScanError> {
        let mut guard = self.schedules.write().await;
        let (by_id, order) = &mut *guard;
        if by_id.contains_key(&schedule.id) {
            return Err(ScanError::DuplicateId(schedule.id));
        }
        order.push(schedule.id.clone());
        by_id.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ScheduledScan>, ScanError> {
        Ok(self.schedules.read().await.0.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ScheduledScan>, ScanError> {
        let guard = self.schedules.read().await;
        let (by_id, order) = &*guard;
        Ok(order.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<ScheduledScan, ScanError> {
        let mut guard = self.schedules.write().await;
        let schedule = guard
            .0
            .get_mut(id)
            .ok_or_else(|| ScanError::ScheduleNotFound(id.to_string()))?;
        schedule.enabled = enabled;
        Ok(schedule.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScanTarget, ScanType};

    fn schedule(id: &str) -> ScheduledScan {
        ScheduledScan {
            id: id.to_string(),
            name: "Nightly".to_string(),
            scan_type: ScanType::Full,
            target: ScanTarget::new("https://example.test"),
            cron_expression: "0 2 * * *".to_string(),
            enabled: true,
            last_run: None,
            next_run: None,
        }
    }

    #[tokio::test]
    async fn test_schedule_store() {
        let repo = InMemoryScheduledScanRepository::new();
        repo.create(schedule("s2")).await.unwrap();
        repo.create(schedule("s1")).await.unwrap();
        assert!(matches!(repo.create(schedule("s1")).await, Err(ScanError::DuplicateId(_))));

        let ids: Vec<String> = repo.list_all().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["s2", "s1"]);

        let disabled = repo.set_enabled("s1", false).await.unwrap();
        assert!(!disabled.enabled);
        assert!(!repo.get_by_id("s1").await.unwrap().unwrap().enabled);
        assert!(matches!(
            repo.set_enabled("missing", true).await,
            Err(ScanError::ScheduleNotFound(_))
        ));
    }
}
