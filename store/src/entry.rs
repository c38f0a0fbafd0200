//! Ledger entries.

use serde::{Deserialize, Serialize};

/// How an alias entry points at another key's value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// The alias key the entry was fetched through.
    pub key: Vec<u8>,
    /// Transaction that committed the reference itself.
    pub tx_id: u64,
    /// Transaction the reference was pinned to when written (`0` = latest).
    pub at_tx: u64,
}

/// A single entry read from the ledger.
///
/// When `referenced_by` is present the entry was fetched via an alias key:
/// `key`/`value` are the *target's*, and the leaf digest committed into the
/// tree is the reference encoding, not the key/value encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Transaction that committed this entry's value.
    pub tx_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_by: Option<Reference>,
}

impl Entry {
    /// The commit id relevant for proof anchoring: the reference's when the
    /// entry was fetched through an alias, the entry's own otherwise.
    pub fn proof_tx_id(&self) -> u64 {
        match &self.referenced_by {
            Some(r) => r.tx_id,
            None => self.tx_id,
        }
    }
}
