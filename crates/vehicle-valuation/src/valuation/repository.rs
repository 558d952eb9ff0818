use super::domain::{ValuationId, ValuationResult};

/// Storage abstraction for computed valuations.
pub trait ValuationRepository: Send + Sync {
    fn insert(&self, result: ValuationResult) -> Result<ValuationResult, RepositoryError>;
    fn fetch(&self, id: &ValuationId) -> Result<Option<ValuationResult>, RepositoryError>;
    /// Most recent valuations first.
    fn recent(&self, limit: usize) -> Result<Vec<ValuationResult>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
