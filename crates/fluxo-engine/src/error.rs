//! Error types for workflow storage

use thiserror::Error;

/// Workflow store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record for the given workflow id
    #[error("Workflow not found: {0}")]
    NotFound(String),

    /// A record with this id already exists
    #[error("Workflow already exists: {0}")]
    Duplicate(String),

    /// JSON encoding of a result failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convert StoreError to fluxo_core::Error
impl From<StoreError> for fluxo_core::Error {
    fn from(err: StoreError) -> Self {
        fluxo_core::Error::Generic(err.to_string())
    }
}
