//! The verified-read engine.

use crate::cache::CheckpointStore;
use crate::error::VerifyError;
use std::sync::{Arc, Mutex};
use tracing::debug;
use verivote_crypto::{leaf_digest_kv, leaf_digest_reference};
use verivote_store::{retry, verify_dual_proof, verify_inclusion, Entry, LedgerStore};
use verivote_types::Checkpoint;

/// Reads entries with cryptographic assurance, advancing a trusted
/// checkpoint on every successful verification.
///
/// The cache mutex brackets the whole load-verify-save cycle: two
/// concurrent verified reads can never interleave one's load of the old
/// checkpoint with the other's save of the new one. The guard is dropped
/// on every exit path, so a failed verification leaves the cache locked-in
/// state unchanged and the lock released.
pub struct VerifiedReader<C: CheckpointStore> {
    store: Arc<dyn LedgerStore>,
    cache: Mutex<C>,
}

impl<C: CheckpointStore> VerifiedReader<C> {
    pub fn new(store: Arc<dyn LedgerStore>, cache: C) -> Self {
        Self {
            store,
            cache: Mutex::new(cache),
        }
    }

    /// Fetch `key` together with proofs anchored at the cached checkpoint,
    /// verify them, and advance the checkpoint.
    ///
    /// Store errors surface unmodified; any proof failure is
    /// [`VerifyError::CorruptedData`] and never advances the cache.
    pub fn verified_get(&self, key: &[u8]) -> Result<Entry, VerifyError> {
        let mut cache = self.cache.lock().expect("checkpoint cache mutex poisoned");

        let trusted = cache.load()?.unwrap_or_else(Checkpoint::genesis);

        let bundle = retry::execute(self.store.as_ref(), |s| {
            s.verifiable_entry(key, trusted.tx_id)
        })?;
        let entry = &bundle.entry;

        // The committed leaf differs for direct and alias-fetched entries;
        // the wrong encoding simply fails the inclusion check below.
        let leaf = match &entry.referenced_by {
            None => leaf_digest_kv(&entry.key, &entry.value),
            Some(r) => leaf_digest_reference(&r.key, &entry.key, r.at_tx),
        };
        let entry_tx = entry.proof_tx_id();

        // The verified key may have been committed before or after the last
        // trusted checkpoint; read the proof from the matching side.
        let (entries_digest, source_id, source_alh, target_id, target_alh) =
            if trusted.tx_id <= entry_tx {
                (
                    bundle.dual.target_tx.entries_digest,
                    trusted.tx_id,
                    trusted.digest,
                    entry_tx,
                    bundle.dual.target_tx.alh(),
                )
            } else {
                (
                    bundle.dual.source_tx.entries_digest,
                    entry_tx,
                    bundle.dual.source_tx.alh(),
                    trusted.tx_id,
                    trusted.digest,
                )
            };

        if !verify_inclusion(&bundle.inclusion, &leaf, &entries_digest) {
            return Err(VerifyError::CorruptedData);
        }
        if !verify_dual_proof(&bundle.dual, source_id, target_id, &source_alh, &target_alh) {
            return Err(VerifyError::CorruptedData);
        }

        let mut advanced = Checkpoint::new(target_id, target_alh);
        advanced.signature = bundle.signature.clone();
        cache.save(&advanced)?;
        debug!(tx_id = target_id, "advanced trusted checkpoint");

        Ok(bundle.entry)
    }

    /// The currently trusted checkpoint, if any.
    pub fn trusted_checkpoint(&self) -> Result<Option<Checkpoint>, VerifyError> {
        let mut cache = self.cache.lock().expect("checkpoint cache mutex poisoned");
        Ok(cache.load()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCheckpointStore;
    use verivote_store::{StoreError, VerifiableEntry, WriteOp};
    use verivote_store_mem::MemoryLedger;
    use verivote_types::RootDigest;

    fn put(key: &[u8], value: &[u8]) -> WriteOp {
        WriteOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    fn reference(key: &[u8], target: &[u8]) -> WriteOp {
        WriteOp::Reference {
            key: key.to_vec(),
            referenced_key: target.to_vec(),
        }
    }

    #[test]
    fn first_read_establishes_trust() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.atomic_batch(&[put(b"k1", b"v1")]).unwrap();

        let reader = VerifiedReader::new(ledger.clone(), MemoryCheckpointStore::new());
        let entry = reader.verified_get(b"k1").unwrap();
        assert_eq!(entry.value, b"v1");

        let cp = reader.trusted_checkpoint().unwrap().unwrap();
        assert_eq!(cp.tx_id, 1);
        assert!(!cp.digest.is_zero());
    }

    #[test]
    fn checkpoint_advances_monotonically() {
        let ledger = Arc::new(MemoryLedger::new());
        let reader = VerifiedReader::new(ledger.clone(), MemoryCheckpointStore::new());

        ledger.atomic_batch(&[put(b"a", b"1")]).unwrap();
        reader.verified_get(b"a").unwrap();
        let first = reader.trusted_checkpoint().unwrap().unwrap().tx_id;

        ledger.atomic_batch(&[put(b"b", b"2")]).unwrap();
        ledger.atomic_batch(&[put(b"c", b"3")]).unwrap();
        reader.verified_get(b"c").unwrap();
        let second = reader.trusted_checkpoint().unwrap().unwrap().tx_id;

        assert_eq!(first, 1);
        assert_eq!(second, 3);
    }

    #[test]
    fn older_entry_verifies_via_reversed_branch() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.atomic_batch(&[put(b"old", b"1")]).unwrap();
        ledger.atomic_batch(&[put(b"mid", b"2")]).unwrap();
        ledger.atomic_batch(&[put(b"new", b"3")]).unwrap();

        let reader = VerifiedReader::new(ledger.clone(), MemoryCheckpointStore::new());
        reader.verified_get(b"new").unwrap();
        assert_eq!(reader.trusted_checkpoint().unwrap().unwrap().tx_id, 3);

        // Entry committed at tx 1, trusted checkpoint at tx 3: the entry's
        // commit is the proof's source and the checkpoint the target.
        let entry = reader.verified_get(b"old").unwrap();
        assert_eq!(entry.value, b"1");
        // No downgrade.
        assert_eq!(reader.trusted_checkpoint().unwrap().unwrap().tx_id, 3);
    }

    #[test]
    fn alias_entries_verify_with_reference_encoding() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .atomic_batch(&[put(b"voter:v1", b"record"), reference(b"citizen:C1", b"voter:v1")])
            .unwrap();

        let reader = VerifiedReader::new(ledger.clone(), MemoryCheckpointStore::new());
        let entry = reader.verified_get(b"citizen:C1").unwrap();
        assert_eq!(entry.key, b"voter:v1");
        assert!(entry.referenced_by.is_some());
    }

    /// Wraps a real ledger and flips one bit in the requested proof part.
    struct TamperingLedger {
        inner: MemoryLedger,
        mode: TamperMode,
    }

    #[derive(Clone, Copy)]
    enum TamperMode {
        InclusionPath,
        DualChain,
    }

    impl LedgerStore for TamperingLedger {
        fn get(&self, key: &[u8], at_tx: u64) -> Result<Entry, StoreError> {
            self.inner.get(key, at_tx)
        }
        fn scan(
            &self,
            prefix: &[u8],
            limit: usize,
            seek_key: Option<&[u8]>,
            descending: bool,
        ) -> Result<Vec<Entry>, StoreError> {
            self.inner.scan(prefix, limit, seek_key, descending)
        }
        fn history(
            &self,
            key: &[u8],
            offset: usize,
            limit: usize,
        ) -> Result<Vec<Entry>, StoreError> {
            self.inner.history(key, offset, limit)
        }
        fn atomic_batch(&self, ops: &[WriteOp]) -> Result<u64, StoreError> {
            self.inner.atomic_batch(ops)
        }
        fn current_checkpoint(&self) -> Result<verivote_types::Checkpoint, StoreError> {
            self.inner.current_checkpoint()
        }
        fn verifiable_entry(
            &self,
            key: &[u8],
            prove_since_tx: u64,
        ) -> Result<VerifiableEntry, StoreError> {
            let mut bundle = self.inner.verifiable_entry(key, prove_since_tx)?;
            match self.mode {
                TamperMode::InclusionPath => {
                    if let Some(first) = bundle.inclusion.path.first_mut() {
                        let mut bytes = *first.as_bytes();
                        bytes[0] ^= 0x01;
                        *first = RootDigest::new(bytes);
                    } else {
                        // Single-leaf tree: corrupt the value instead, so
                        // the recomputed leaf no longer matches the root.
                        bundle.entry.value.push(0xFF);
                    }
                }
                TamperMode::DualChain => {
                    if let Some(meta) = bundle.dual.chain.first_mut() {
                        let mut bytes = *meta.entries_digest.as_bytes();
                        bytes[0] ^= 0x01;
                        meta.entries_digest = RootDigest::new(bytes);
                    }
                }
            }
            Ok(bundle)
        }
        fn verifiable_tx(
            &self,
            target_tx: u64,
            source_tx: u64,
        ) -> Result<verivote_store::DualProof, StoreError> {
            self.inner.verifiable_tx(target_tx, source_tx)
        }
    }

    fn tampered(mode: TamperMode) -> TamperingLedger {
        let inner = MemoryLedger::new();
        inner
            .atomic_batch(&[put(b"k1", b"v1"), put(b"k2", b"v2")])
            .unwrap();
        inner.atomic_batch(&[put(b"k3", b"v3")]).unwrap();
        TamperingLedger { inner, mode }
    }

    #[test]
    fn tampered_inclusion_proof_is_corrupted_data() {
        let reader = VerifiedReader::new(
            Arc::new(tampered(TamperMode::InclusionPath)),
            MemoryCheckpointStore::new(),
        );
        let err = reader.verified_get(b"k1").unwrap_err();
        assert!(matches!(err, VerifyError::CorruptedData));
        assert!(err.is_fatal());
        // The cache never advanced.
        assert!(reader.trusted_checkpoint().unwrap().is_none());
    }

    #[test]
    fn tampered_dual_proof_is_corrupted_data() {
        let reader = VerifiedReader::new(
            Arc::new(tampered(TamperMode::DualChain)),
            MemoryCheckpointStore::new(),
        );
        let err = reader.verified_get(b"k3").unwrap_err();
        assert!(matches!(err, VerifyError::CorruptedData));
        assert!(reader.trusted_checkpoint().unwrap().is_none());
    }

    #[test]
    fn missing_key_surfaces_store_error() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.atomic_batch(&[put(b"k", b"v")]).unwrap();
        let reader = VerifiedReader::new(ledger, MemoryCheckpointStore::new());
        let err = reader.verified_get(b"absent").unwrap_err();
        assert!(matches!(err, VerifyError::Store(StoreError::NotFound(_))));
    }
}
