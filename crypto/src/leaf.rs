//! Leaf digest encodings.
//!
//! An entry committed into a transaction's entry tree is digested in one of
//! two ways, with a one-byte domain separator:
//!
//! - a direct key/value pair: `H(0x00 || key || value)`
//! - an alias reference:      `H(0x01 || alias_key || target_key || at_tx)`
//!
//! Verification must pick the encoding matching how the entry was fetched;
//! using the wrong one yields a digest that is simply not in the tree, so
//! the inclusion check fails (no panic).

use crate::hash::blake2b_256_multi;
use verivote_types::RootDigest;

const LEAF_KV: &[u8] = &[0x00];
const LEAF_REFERENCE: &[u8] = &[0x01];

/// Digest a direct key/value entry.
pub fn leaf_digest_kv(key: &[u8], value: &[u8]) -> RootDigest {
    RootDigest::new(blake2b_256_multi(&[LEAF_KV, key, value]))
}

/// Digest an alias reference entry pointing `alias_key` at `target_key`.
///
/// `at_tx` is the transaction the reference was pinned to when written
/// (`0` means "resolve to latest").
pub fn leaf_digest_reference(alias_key: &[u8], target_key: &[u8], at_tx: u64) -> RootDigest {
    RootDigest::new(blake2b_256_multi(&[
        LEAF_REFERENCE,
        alias_key,
        target_key,
        &at_tx.to_be_bytes(),
    ]))
}
