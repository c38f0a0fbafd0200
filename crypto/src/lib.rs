//! Hashing primitives for verivote.
//!
//! Everything the proof layer needs to recompute digests independently of
//! the ledger's claims: Blake2b-256, the leaf encodings for direct and
//! alias-reference entries, and Merkle tree helpers for per-transaction
//! entry trees.

pub mod hash;
pub mod leaf;
pub mod merkle;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use leaf::{leaf_digest_kv, leaf_digest_reference};
pub use merkle::{audit_path, merkle_root, verify_audit_path};
