use super::domain::{Broadcast, BroadcastId};
use crate::store::RepositoryError;

/// Storage abstraction for announcements.
pub trait BroadcastRepository: Send + Sync {
    fn insert(&self, broadcast: Broadcast) -> Result<Broadcast, RepositoryError>;
    fn update(&self, broadcast: Broadcast) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BroadcastId) -> Result<Option<Broadcast>, RepositoryError>;
    fn list(&self) -> Result<Vec<Broadcast>, RepositoryError>;
}
