//! Trusted checkpoint of an authenticated ledger.

use crate::RootDigest;
use serde::{Deserialize, Serialize};

/// A summary of everything committed up to and including `tx_id`.
///
/// Exactly one checkpoint is trusted at a time per ledger instance. It is
/// only replaced after a successful proof verification, and its `tx_id`
/// never decreases over the lifetime of a checkpoint cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Identifier of the newest transaction covered by this checkpoint.
    pub tx_id: u64,
    /// Accumulated digest of the ledger state at `tx_id`.
    pub digest: RootDigest,
    /// Server signature over the state, if the ledger signs its checkpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl Checkpoint {
    pub fn new(tx_id: u64, digest: RootDigest) -> Self {
        Self {
            tx_id,
            digest,
            signature: None,
        }
    }

    /// The genesis checkpoint: nothing committed, zero digest.
    pub fn genesis() -> Self {
        Self::new(0, RootDigest::ZERO)
    }
}
