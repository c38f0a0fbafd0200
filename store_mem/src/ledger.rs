//! In-memory ledger implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use verivote_crypto::{audit_path, leaf_digest_kv, leaf_digest_reference, merkle_root};
use verivote_store::{
    DualProof, Entry, InclusionProof, LedgerStore, Reference, StoreError, TxMetadata,
    VerifiableEntry, WriteOp,
};
use verivote_types::{Checkpoint, RootDigest};

/// What a key's version holds: bytes, or a pointer at another key.
#[derive(Clone, Debug)]
enum StoredValue {
    Direct(Vec<u8>),
    Reference { target: Vec<u8>, at_tx: u64 },
}

#[derive(Clone, Debug)]
struct Version {
    tx_id: u64,
    /// Position of this write inside its transaction's entry tree.
    entry_index: u32,
    value: StoredValue,
}

struct TxRecord {
    meta: TxMetadata,
    /// Leaf digests in commit order, kept to rebuild audit paths on demand.
    leaves: Vec<RootDigest>,
}

struct Inner {
    /// Per-key version history, oldest first.
    versions: BTreeMap<Vec<u8>, Vec<Version>>,
    /// All committed transactions; index 0 is the synthetic genesis.
    txs: Vec<TxRecord>,
}

/// Thread-safe in-memory authenticated ledger.
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                versions: BTreeMap::new(),
                txs: vec![TxRecord {
                    meta: TxMetadata::genesis(),
                    leaves: Vec::new(),
                }],
            }),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn latest_version<'a>(&'a self, key: &[u8], at_tx: u64) -> Option<&'a Version> {
        let versions = self.versions.get(key)?;
        if at_tx == 0 {
            versions.last()
        } else {
            versions.iter().rev().find(|v| v.tx_id <= at_tx)
        }
    }

    /// Resolve a key to an entry, following one level of alias indirection.
    fn resolve(&self, key: &[u8], at_tx: u64) -> Result<Entry, StoreError> {
        let version = self
            .latest_version(key, at_tx)
            .ok_or_else(|| StoreError::NotFound(String::from_utf8_lossy(key).into_owned()))?;
        match &version.value {
            StoredValue::Direct(bytes) => Ok(Entry {
                key: key.to_vec(),
                value: bytes.clone(),
                tx_id: version.tx_id,
                referenced_by: None,
            }),
            StoredValue::Reference { target, at_tx: pinned } => {
                let target_version = self
                    .latest_version(target, *pinned)
                    .ok_or_else(|| {
                        StoreError::NotFound(String::from_utf8_lossy(target).into_owned())
                    })?;
                let bytes = match &target_version.value {
                    StoredValue::Direct(bytes) => bytes.clone(),
                    StoredValue::Reference { .. } => {
                        return Err(StoreError::InvalidRequest(
                            "reference points at another reference".into(),
                        ))
                    }
                };
                Ok(Entry {
                    key: target.clone(),
                    value: bytes,
                    tx_id: target_version.tx_id,
                    referenced_by: Some(Reference {
                        key: key.to_vec(),
                        tx_id: version.tx_id,
                        at_tx: *pinned,
                    }),
                })
            }
        }
    }

    fn head(&self) -> &TxRecord {
        self.txs.last().expect("genesis always present")
    }

    fn metadata(&self, tx_id: u64) -> Result<&TxRecord, StoreError> {
        self.txs
            .get(tx_id as usize)
            .ok_or_else(|| StoreError::NotFound(format!("tx {tx_id}")))
    }

    fn dual_proof(&self, source_tx: u64, target_tx: u64) -> Result<DualProof, StoreError> {
        let (source, target) = if source_tx <= target_tx {
            (source_tx, target_tx)
        } else {
            (target_tx, source_tx)
        };
        let source_meta = self.metadata(source)?.meta.clone();
        let target_meta = self.metadata(target)?.meta.clone();
        let chain = self.txs[(source + 1) as usize..=target as usize]
            .iter()
            .map(|t| t.meta.clone())
            .collect();
        Ok(DualProof {
            source_tx: source_meta,
            target_tx: target_meta,
            chain,
        })
    }
}

impl LedgerStore for MemoryLedger {
    fn get(&self, key: &[u8], at_tx: u64) -> Result<Entry, StoreError> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.resolve(key, at_tx)
    }

    fn scan(
        &self,
        prefix: &[u8],
        limit: usize,
        seek_key: Option<&[u8]>,
        descending: bool,
    ) -> Result<Vec<Entry>, StoreError> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        let mut keys: Vec<&Vec<u8>> = inner
            .versions
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| match seek_key {
                Some(seek) if descending => k.as_slice() < seek,
                Some(seek) => k.as_slice() > seek,
                None => true,
            })
            .collect();
        if descending {
            keys.reverse();
        }
        let mut out = Vec::new();
        for key in keys {
            if limit > 0 && out.len() >= limit {
                break;
            }
            out.push(inner.resolve(key, 0)?);
        }
        Ok(out)
    }

    fn history(&self, key: &[u8], offset: usize, limit: usize) -> Result<Vec<Entry>, StoreError> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        let versions = inner
            .versions
            .get(key)
            .ok_or_else(|| StoreError::NotFound(String::from_utf8_lossy(key).into_owned()))?;
        let out = versions
            .iter()
            .skip(offset)
            .take(if limit == 0 { usize::MAX } else { limit })
            .filter_map(|v| match &v.value {
                StoredValue::Direct(bytes) => Some(Entry {
                    key: key.to_vec(),
                    value: bytes.clone(),
                    tx_id: v.tx_id,
                    referenced_by: None,
                }),
                StoredValue::Reference { .. } => None,
            })
            .collect();
        Ok(out)
    }

    fn atomic_batch(&self, ops: &[WriteOp]) -> Result<u64, StoreError> {
        if ops.is_empty() {
            return Err(StoreError::InvalidRequest("empty batch".into()));
        }
        let mut inner = self.inner.lock().expect("ledger mutex poisoned");

        let leaves: Vec<RootDigest> = ops
            .iter()
            .map(|op| match op {
                WriteOp::Put { key, value } => leaf_digest_kv(key, value),
                WriteOp::Reference {
                    key,
                    referenced_key,
                } => leaf_digest_reference(key, referenced_key, 0),
            })
            .collect();

        let tx_id = inner.txs.len() as u64;
        let prev_alh = inner.head().meta.alh();
        let meta = TxMetadata {
            tx_id,
            prev_alh,
            entries_digest: merkle_root(&leaves),
        };
        inner.txs.push(TxRecord { meta, leaves });

        for (index, op) in ops.iter().enumerate() {
            let (key, value) = match op {
                WriteOp::Put { key, value } => (key.clone(), StoredValue::Direct(value.clone())),
                WriteOp::Reference {
                    key,
                    referenced_key,
                } => (
                    key.clone(),
                    StoredValue::Reference {
                        target: referenced_key.clone(),
                        at_tx: 0,
                    },
                ),
            };
            inner.versions.entry(key).or_default().push(Version {
                tx_id,
                entry_index: index as u32,
                value,
            });
        }
        Ok(tx_id)
    }

    fn current_checkpoint(&self) -> Result<Checkpoint, StoreError> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        let head = inner.head();
        Ok(Checkpoint::new(head.meta.tx_id, head.meta.alh()))
    }

    fn verifiable_entry(
        &self,
        key: &[u8],
        prove_since_tx: u64,
    ) -> Result<VerifiableEntry, StoreError> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        let entry = inner.resolve(key, 0)?;

        // The proven leaf is the one the client will recompute: the alias
        // reference when the entry was fetched through one, the direct
        // key/value otherwise.
        let (proof_tx, entry_index) = match &entry.referenced_by {
            Some(r) => {
                let version = inner
                    .latest_version(&r.key, 0)
                    .ok_or_else(|| StoreError::NotFound(String::from_utf8_lossy(key).into_owned()))?;
                (r.tx_id, version.entry_index)
            }
            None => {
                let version = inner
                    .latest_version(&entry.key, 0)
                    .ok_or_else(|| StoreError::NotFound(String::from_utf8_lossy(key).into_owned()))?;
                (entry.tx_id, version.entry_index)
            }
        };

        let record = inner.metadata(proof_tx)?;
        let inclusion = InclusionProof {
            leaf_index: entry_index,
            width: record.leaves.len() as u32,
            path: audit_path(&record.leaves, entry_index as usize),
        };
        let dual = inner.dual_proof(prove_since_tx, proof_tx)?;
        Ok(VerifiableEntry {
            entry,
            inclusion,
            dual,
            signature: None,
        })
    }

    fn verifiable_tx(&self, target_tx: u64, source_tx: u64) -> Result<DualProof, StoreError> {
        let inner = self.inner.lock().expect("ledger mutex poisoned");
        inner.dual_proof(source_tx, target_tx)
    }
}
