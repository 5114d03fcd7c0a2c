pub mod job_repo;
pub mod schedule_repo;

pub use job_repo::{InMemoryScanJobRepository, ScanJobRepository};
pub use schedule_repo::{InMemoryScheduledScanRepository, ScheduledScanRepository};
