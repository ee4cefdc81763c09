use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load configuration: {0}")]
    Config(#[from] figment::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the embedding provider. The engine recovers from all of
/// them by serving lexical-only results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    #[error("embedding request timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding request cancelled")]
    Cancelled,

    #[error("embedding transport failed: {0}")]
    Transport(String),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no embedding provider configured")]
    Disabled,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("chunk store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt chunk record at {location}: {message}")]
    Corrupt { location: String, message: String },
}

/// Coarse classification for the layer that turns errors into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; the caller should fix the request.
    Client,
    /// The project does not exist for this owner.
    Access,
    /// Infrastructure failure on our side.
    Server,
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RetrievalError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        RetrievalError::Internal(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RetrievalError::InvalidRequest(_) => ErrorKind::Client,
            RetrievalError::ProjectNotFound(_) => ErrorKind::Access,
            RetrievalError::Store(_) | RetrievalError::Internal(_) => ErrorKind::Server,
        }
    }
}
