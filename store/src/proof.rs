//! Proof objects and their verification.
//!
//! The ledger's commitment scheme is an accumulated linear hash (alh):
//! every transaction `i` commits a Merkle tree over its entries (root
//! `entries_digest`) and chains `alh_i = H(i || alh_{i-1} || entries_digest)`.
//! Transaction 0 is the synthetic genesis with a zero digest, so a client
//! that has trusted nothing yet verifies uniformly from source 0.
//!
//! Verification never trusts a digest the server merely claims: both proof
//! endpoints are recomputed from the metadata inside the proof and compared
//! against the values the caller already trusts.

use serde::{Deserialize, Serialize};
use verivote_crypto::{blake2b_256_multi, verify_audit_path};
use verivote_types::RootDigest;

/// Per-transaction metadata, sufficient to recompute the transaction's alh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMetadata {
    pub tx_id: u64,
    /// Alh of the preceding transaction.
    pub prev_alh: RootDigest,
    /// Merkle root over this transaction's entry leaf digests.
    pub entries_digest: RootDigest,
}

impl TxMetadata {
    /// The synthetic genesis metadata (transaction 0).
    pub fn genesis() -> Self {
        Self {
            tx_id: 0,
            prev_alh: RootDigest::ZERO,
            entries_digest: RootDigest::ZERO,
        }
    }

    /// Recompute this transaction's accumulated linear hash.
    pub fn alh(&self) -> RootDigest {
        if self.tx_id == 0 {
            return RootDigest::ZERO;
        }
        RootDigest::new(blake2b_256_multi(&[
            &self.tx_id.to_be_bytes(),
            self.prev_alh.as_bytes(),
            self.entries_digest.as_bytes(),
        ]))
    }
}

/// Proof that a leaf digest is present in one transaction's entry tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub leaf_index: u32,
    pub width: u32,
    pub path: Vec<RootDigest>,
}

/// Proof that the target checkpoint's history is an append-only extension
/// of the source checkpoint's.
///
/// Carries both endpoints' metadata plus the linear metadata chain
/// `(source, target]`, so a verifier can recompute every digest involved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualProof {
    pub source_tx: TxMetadata,
    pub target_tx: TxMetadata,
    /// Metadata for every transaction in `(source_tx, target_tx]`, in order.
    pub chain: Vec<TxMetadata>,
}

/// Verify that `leaf` is included in the entry tree with root `entries_digest`.
pub fn verify_inclusion(
    proof: &InclusionProof,
    leaf: &RootDigest,
    entries_digest: &RootDigest,
) -> bool {
    verify_audit_path(
        leaf,
        proof.leaf_index as usize,
        proof.width as usize,
        &proof.path,
        entries_digest,
    )
}

/// Verify that the checkpoint `(source_id, source_alh)` is consistently
/// extended by `(target_id, target_alh)`.
///
/// Both endpoint digests are recomputed from the proof's own metadata and
/// compared against the caller-supplied values; the chain in between must
/// link hash-to-hash with consecutive transaction ids.
pub fn verify_dual_proof(
    proof: &DualProof,
    source_id: u64,
    target_id: u64,
    source_alh: &RootDigest,
    target_alh: &RootDigest,
) -> bool {
    if source_id > target_id {
        return false;
    }
    if proof.source_tx.tx_id != source_id || proof.target_tx.tx_id != target_id {
        return false;
    }
    if proof.source_tx.alh() != *source_alh || proof.target_tx.alh() != *target_alh {
        return false;
    }
    if source_id == target_id {
        return proof.chain.is_empty() && source_alh == target_alh;
    }
    if proof.chain.len() as u64 != target_id - source_id {
        return false;
    }
    let mut running = *source_alh;
    let mut expected_id = source_id;
    for meta in &proof.chain {
        expected_id += 1;
        if meta.tx_id != expected_id || meta.prev_alh != running {
            return false;
        }
        running = meta.alh();
    }
    running == *target_alh
}
