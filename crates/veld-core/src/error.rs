//! Error types for veld-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using veld-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in veld-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No active owner identity
    #[error("No active owner identity")]
    AuthRequired,

    /// Ownership mismatch on a fetch or mutation
    #[error("Access denied for the requested record")]
    AccessDenied,

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Remote unreachable or timed out
    #[error("Remote unreachable: {0}")]
    Network(String),

    /// Remote API rejected the request
    #[error("Remote API error: {0}")]
    Remote(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RemoteError> for Error {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::AuthRequired => Self::AuthRequired,
            RemoteError::AccessDenied => Self::AccessDenied,
            RemoteError::NotFound(id) => Self::NotFound(id),
            RemoteError::Network(message) => Self::Network(message),
            RemoteError::Api(message)
            | RemoteError::Decode(message)
            | RemoteError::InvalidConfiguration(message) => Self::Remote(message),
        }
    }
}
