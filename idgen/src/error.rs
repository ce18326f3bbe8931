//! Error types for ID allocation.

use common::StorageError;

/// Error type for ID allocation operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The counter store could not be reached or rejected the operation.
    ///
    /// A failed increment applies no delta, so the operation is safe to retry
    /// at a higher layer.
    Storage(String),

    /// A persisted counter value could not be decoded.
    Encoding(String),

    /// Invalid input or configuration (zero count, zero block size, ...).
    InvalidInput(String),

    /// Internal errors indicating bugs or invariant violations.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Storage(msg) => Error::Storage(msg),
            StorageError::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Result type alias for ID allocation operations.
pub type Result<T> = std::result::Result<T, Error>;
