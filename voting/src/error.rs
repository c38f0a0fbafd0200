//! Workflow error taxonomy.
//!
//! Validation and precondition failures are detected before any write, so
//! every error here except `Store` implies the ledger was left untouched.

use thiserror::Error;
use verivote_store::StoreError;
use verivote_types::IdError;

#[derive(Debug, Error)]
pub enum VotingError {
    /// Bad or missing input. Carries every violation, not just the first.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("no voter is registered under this id")]
    NotRegistered,

    #[error("a voter is already registered for this citizen id")]
    AlreadyRegistered,

    #[error("voter is not approved to vote")]
    NotApproved,

    #[error("voter is already approved")]
    AlreadyApproved,

    #[error("voter has already voted")]
    AlreadyVoted,

    #[error("no such ballot")]
    NoSuchBallot,

    #[error("ballot has already been cast")]
    AlreadyCast,

    /// A stored record failed to decode. Individual records hitting this
    /// during a tally are skipped and logged instead.
    #[error("stored record is malformed: {0}")]
    Malformed(String),

    #[error("identifier generation failed: {0}")]
    Id(#[from] IdError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VotingError {
    fn validation(violations: Vec<String>) -> Self {
        VotingError::Validation(violations)
    }

    /// Build a validation error from collected violations, or pass.
    pub fn from_violations(violations: Vec<String>) -> Result<(), VotingError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(VotingError::validation(violations))
        }
    }
}
