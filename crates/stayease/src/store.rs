use thiserror::Error;

/// Error enumeration shared by all repository traits.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
