use super::domain::{MaintenanceLog, MaintenanceLogId, MaintenanceTask, TaskId};
use crate::store::RepositoryError;

/// Storage abstraction for tasks and their completion logs.
pub trait MaintenanceRepository: Send + Sync {
    fn insert_task(&self, task: MaintenanceTask) -> Result<MaintenanceTask, RepositoryError>;
    fn update_task(&self, task: MaintenanceTask) -> Result<(), RepositoryError>;
    fn fetch_task(&self, id: &TaskId) -> Result<Option<MaintenanceTask>, RepositoryError>;
    fn tasks(&self) -> Result<Vec<MaintenanceTask>, RepositoryError>;

    fn insert_log(&self, log: MaintenanceLog) -> Result<MaintenanceLog, RepositoryError>;
    fn update_log(&self, log: MaintenanceLog) -> Result<(), RepositoryError>;
    fn fetch_log(&self, id: &MaintenanceLogId) -> Result<Option<MaintenanceLog>, RepositoryError>;
    fn logs(&self) -> Result<Vec<MaintenanceLog>, RepositoryError>;
}
