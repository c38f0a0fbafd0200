//! Audit error types.

use thiserror::Error;
use verivote_verify::CacheError;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed server response: {0}")]
    BadResponse(String),

    /// The audit needed a consistency proof but none was supplied.
    #[error("consistency proof required but missing")]
    MissingProof,

    #[error("checkpoint cache error: {0}")]
    Cache(#[from] CacheError),
}
