use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;

/// Runs background scan executions, at most `max_concurrent` at a time.
/// Tasks beyond the limit wait for a permit in submission order.
#[derive(Clone)]
pub struct TaskManager {
    max_concurrent: usize,
    concurrency_semaphore: Arc<Semaphore>,
    active_handles: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl TaskManager {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            concurrency_semaphore: Arc::new(Semaphore::new(max_concurrent)),
            active_handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Spawn `task` once a slot is free. The handle is tracked under `task_id`
    /// until the task finishes.
    pub async fn submit<F>(&self, task_id: String, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.concurrency_semaphore);
        let registry = Arc::clone(&self.active_handles);
        let key = task_id.clone();

        // Held across the spawn so the task's own removal runs after the insert
        let mut handles = self.active_handles.lock().await;

        let handle = tokio::spawn(async move {
            match semaphore.acquire_owned().await {
                Ok(permit) => {
                    task.await;
                    drop(permit);
                }
                Err(_) => {
                    tracing::warn!(task_id = %key, "task manager closed before the task could start");
                }
            }

            registry.lock().await.remove(&key);
        });

        if handles.insert(task_id.clone(), handle).is_some() {
            tracing::warn!(task_id = %task_id, "replaced the handle of a task submitted twice");
        }
        tracing::debug!(task_id = %task_id, "submitted background task");
    }

    pub async fn statistics(&self) -> TaskManagerStats {
        let active_tasks = self.active_handles.lock().await.len();
        let available_slots = self.concurrency_semaphore.available_permits();
        let running_tasks = self.max_concurrent.saturating_sub(available_slots);

        TaskManagerStats {
            active_tasks,
            running_tasks,
            queued_tasks: active_tasks.saturating_sub(running_tasks),
            available_slots,
            max_concurrent: self.max_concurrent,
        }
    }

    /// Wait until every submitted task has finished (useful for testing and shutdown)
    pub async fn wait_for_idle(&self) {
        loop {
            if self.active_handles.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stop accepting queued work, give running tasks up to `grace` to finish
    /// and abort whatever is left. Returns the number of aborted tasks.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        tracing::info!("Shutting down task manager...");
        self.concurrency_semaphore.close();

        if tokio::time::timeout(grace, self.wait_for_idle()).await.is_ok() {
            tracing::info!("Task manager shutdown complete");
            return 0;
        }

        let mut handles = self.active_handles.lock().await;
        let aborted = handles.len();
        for (task_id, handle) in handles.drain() {
            tracing::debug!(task_id = %task_id, "aborting task");
            handle.abort();
        }

        tracing::warn!(aborted, "task manager shutdown aborted unfinished tasks");
        aborted
    }
}

/// Worker pool occupancy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskManagerStats {
    pub active_tasks: usize,
    pub running_tasks: usize,
    pub queued_tasks: usize,
    pub available_slots: usize,
    pub max_concurrent: usize,
}
