//! Store error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or server hiccup. Safe for the caller to retry.
    #[error("transient store error: {0}")]
    Transient(String),

    /// A bounded store call exceeded its deadline. Safe to retry.
    #[error("store call timed out: {0}")]
    Timeout(String),

    /// The server-side session lapsed; retried transparently exactly once
    /// after a reconnect (see [`crate::retry::execute`]).
    #[error("store session expired")]
    SessionExpired,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the caller may retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Transient(_) | StoreError::Timeout(_) | StoreError::SessionExpired
        )
    }
}
