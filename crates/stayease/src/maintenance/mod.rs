//! Recurring maintenance scheduling with an admin review gate on completion
//! reports.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    CompletionStatus, Frequency, MaintenanceLog, MaintenanceLogId, MaintenanceTask, NewTask,
    TaskId,
};
pub use repository::MaintenanceRepository;
pub use router::{maintenance_router, MaintenanceApi};
pub use service::{MaintenanceError, MaintenanceService, ReviewOutcome};
