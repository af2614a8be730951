//! Error types for fluxo-core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for fluxo-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent and pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// Agent or engine initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// A stage did not finish within its time budget
    #[error("Stage '{stage}' timed out after {timeout:?}")]
    StageTimeout { stage: String, timeout: Duration },

    /// The graph executor has no async run entry point
    #[error("Unsupported graph executor: {0}")]
    UnsupportedExecutor(String),

    /// The graph definition is inconsistent
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// The approver kept rejecting the processed result
    #[error("Approval not granted after {attempts} attempts")]
    ApprovalRetriesExhausted { attempts: u32 },

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error is a stage timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::StageTimeout { .. })
    }
}
