use super::domain::{Complaint, ComplaintId, ComplaintLog, ComplaintRating};
use crate::store::RepositoryError;

/// Storage abstraction for complaints, their audit trail, and ratings, so the
/// lifecycle service can be exercised in isolation.
///
/// Logs are append-only and ratings are unique per complaint; implementations
/// must return [`RepositoryError::Conflict`] on a duplicate rating.
pub trait ComplaintRepository: Send + Sync {
    fn insert(&self, complaint: Complaint) -> Result<Complaint, RepositoryError>;
    fn update(&self, complaint: Complaint) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ComplaintId) -> Result<Option<Complaint>, RepositoryError>;
    fn list(&self) -> Result<Vec<Complaint>, RepositoryError>;

    fn append_log(&self, log: ComplaintLog) -> Result<(), RepositoryError>;
    fn logs_for(&self, id: &ComplaintId) -> Result<Vec<ComplaintLog>, RepositoryError>;

    fn insert_rating(&self, rating: ComplaintRating) -> Result<(), RepositoryError>;
    fn rating_for(&self, id: &ComplaintId) -> Result<Option<ComplaintRating>, RepositoryError>;
    fn ratings(&self) -> Result<Vec<ComplaintRating>, RepositoryError>;
}
