use super::domain::Member;
use crate::actor::MemberId;
use crate::store::RepositoryError;

/// Storage abstraction for the member directory.
///
/// Emails are unique; implementations must return
/// [`RepositoryError::Conflict`] when an insert would duplicate one.
pub trait DirectoryRepository: Send + Sync {
    fn insert(&self, member: Member) -> Result<Member, RepositoryError>;
    fn update(&self, member: Member) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &MemberId) -> Result<Option<Member>, RepositoryError>;
    fn fetch_by_email(&self, email: &str) -> Result<Option<Member>, RepositoryError>;
    fn list(&self) -> Result<Vec<Member>, RepositoryError>;
    fn remove(&self, id: &MemberId) -> Result<(), RepositoryError>;
}
