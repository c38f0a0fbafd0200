//! The `LedgerStore` trait — every operation the voting and verification
//! layers consume from the authenticated ledger.

use crate::entry::Entry;
use crate::error::StoreError;
use crate::proof::{DualProof, InclusionProof};
use serde::{Deserialize, Serialize};
use verivote_types::Checkpoint;

/// A single write inside an atomic batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    /// Direct key/value write.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Alias write: `key` becomes a reference to `referenced_key`'s value.
    Reference {
        key: Vec<u8>,
        referenced_key: Vec<u8>,
    },
}

/// An entry bundled with the proofs anchoring it to a caller-trusted
/// checkpoint: inclusion within its transaction's entry tree, plus a dual
/// proof linking that transaction to the prove-since anchor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifiableEntry {
    pub entry: Entry,
    pub inclusion: InclusionProof,
    pub dual: DualProof,
    /// Server signature over the target state, if the ledger signs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

/// Abstract append-only authenticated key-value ledger.
///
/// `verifiable_entry` and `verifiable_tx` are the two consumer-facing views
/// of the ledger's proof-between operation: the first anchors a specific
/// key's entry, the second links two bare transaction ids.
pub trait LedgerStore: Send + Sync {
    /// Point read. `at_tx` pins a historical version; `0` reads the latest.
    fn get(&self, key: &[u8], at_tx: u64) -> Result<Entry, StoreError>;

    /// Latest entries under `prefix`, ordered by key. `seek_key` resumes a
    /// previous scan; `descending` reverses the order.
    fn scan(
        &self,
        prefix: &[u8],
        limit: usize,
        seek_key: Option<&[u8]>,
        descending: bool,
    ) -> Result<Vec<Entry>, StoreError>;

    /// All committed versions of `key`, oldest first.
    fn history(&self, key: &[u8], offset: usize, limit: usize) -> Result<Vec<Entry>, StoreError>;

    /// Apply all operations as a single all-or-nothing transaction and
    /// return the committed transaction id.
    fn atomic_batch(&self, ops: &[WriteOp]) -> Result<u64, StoreError>;

    /// The ledger's current (unverified) checkpoint.
    fn current_checkpoint(&self) -> Result<Checkpoint, StoreError>;

    /// The entry for `key` plus proofs anchored at `prove_since_tx`
    /// (use `0` when nothing is trusted yet).
    fn verifiable_entry(
        &self,
        key: &[u8],
        prove_since_tx: u64,
    ) -> Result<VerifiableEntry, StoreError>;

    /// Dual proof linking `source_tx` to `target_tx` (order-normalized by
    /// the implementation: the smaller id becomes the proof's source).
    fn verifiable_tx(&self, target_tx: u64, source_tx: u64) -> Result<DualProof, StoreError>;

    /// Re-establish the server session. No-op for embedded backends.
    fn reconnect(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
