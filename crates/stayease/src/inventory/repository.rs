use super::domain::{InventoryItem, InventoryLog, ItemId};
use crate::store::RepositoryError;

/// Storage abstraction for stock items and their movement trail.
pub trait InventoryRepository: Send + Sync {
    fn insert(&self, item: InventoryItem) -> Result<InventoryItem, RepositoryError>;
    fn update(&self, item: InventoryItem) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ItemId) -> Result<Option<InventoryItem>, RepositoryError>;
    fn list(&self) -> Result<Vec<InventoryItem>, RepositoryError>;

    fn append_log(&self, log: InventoryLog) -> Result<(), RepositoryError>;
    fn logs_for(&self, id: &ItemId) -> Result<Vec<InventoryLog>, RepositoryError>;
}
