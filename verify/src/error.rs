//! Verification error types.

use crate::cache::CacheError;
use thiserror::Error;
use verivote_store::StoreError;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// A proof failed to verify. The server's data is suspect; retrying
    /// cannot help, and nothing depending on this trust chain should
    /// proceed. Never downgraded to a warning.
    #[error("corrupted data: proof verification failed")]
    CorruptedData,

    /// Transport or server error, surfaced unmodified so the caller can
    /// apply its own retry policy.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("checkpoint cache error: {0}")]
    Cache(#[from] CacheError),
}

impl VerifyError {
    /// Whether the failure is fatal for the current trust chain.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VerifyError::CorruptedData)
    }
}
