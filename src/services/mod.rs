pub mod check_registry;
pub mod checks;
pub mod scan_orchestrator;
pub mod schedule_service;
pub mod task_manager;

// Re-export commonly used types
pub use check_registry::CheckRegistry;
pub use checks::SecurityCheck;
pub use scan_orchestrator::ScanOrchestrator;
pub use schedule_service::ScheduleService;
pub use task_manager::{TaskManager, TaskManagerStats};
