use super::domain::{SupportMessage, SupportTicket, TicketId};
use crate::store::RepositoryError;

/// Storage abstraction for tickets and their message threads.
pub trait SupportRepository: Send + Sync {
    fn insert(&self, ticket: SupportTicket) -> Result<SupportTicket, RepositoryError>;
    fn update(&self, ticket: SupportTicket) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TicketId) -> Result<Option<SupportTicket>, RepositoryError>;
    fn list(&self) -> Result<Vec<SupportTicket>, RepositoryError>;

    fn append_message(&self, message: SupportMessage) -> Result<(), RepositoryError>;
    fn messages_for(&self, id: &TicketId) -> Result<Vec<SupportMessage>, RepositoryError>;
}
