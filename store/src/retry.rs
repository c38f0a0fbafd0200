//! Session-expiry retry policy.
//!
//! Remote ledger sessions lapse; the contract is exactly one transparent
//! reconnect-and-retry before the error surfaces. The helper is generic
//! over the operation's result type, so call sites keep their concrete
//! types end to end.

use crate::error::StoreError;
use crate::ledger::LedgerStore;
use tracing::warn;

/// Run `op` against `store`, reconnecting and retrying exactly once if the
/// session has expired. All other errors surface unmodified.
pub fn execute<S, T, F>(store: &S, mut op: F) -> Result<T, StoreError>
where
    S: LedgerStore + ?Sized,
    F: FnMut(&S) -> Result<T, StoreError>,
{
    match op(store) {
        Err(StoreError::SessionExpired) => {
            warn!("ledger session expired, reconnecting");
            store.reconnect()?;
            op(store)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::ledger::{VerifiableEntry, WriteOp};
    use crate::proof::DualProof;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use verivote_types::Checkpoint;

    /// A store whose reads fail with `SessionExpired` a set number of times.
    struct FlakyStore {
        failures: AtomicUsize,
        reconnects: AtomicUsize,
    }

    impl FlakyStore {
        fn failing(n: usize) -> Self {
            Self {
                failures: AtomicUsize::new(n),
                reconnects: AtomicUsize::new(0),
            }
        }

        fn try_get(&self) -> Result<u64, StoreError> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::SessionExpired);
            }
            Ok(42)
        }
    }

    impl LedgerStore for FlakyStore {
        fn get(&self, _key: &[u8], _at_tx: u64) -> Result<Entry, StoreError> {
            unimplemented!()
        }
        fn scan(
            &self,
            _prefix: &[u8],
            _limit: usize,
            _seek_key: Option<&[u8]>,
            _descending: bool,
        ) -> Result<Vec<Entry>, StoreError> {
            unimplemented!()
        }
        fn history(
            &self,
            _key: &[u8],
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<Entry>, StoreError> {
            unimplemented!()
        }
        fn atomic_batch(&self, _ops: &[WriteOp]) -> Result<u64, StoreError> {
            unimplemented!()
        }
        fn current_checkpoint(&self) -> Result<Checkpoint, StoreError> {
            unimplemented!()
        }
        fn verifiable_entry(
            &self,
            _key: &[u8],
            _prove_since_tx: u64,
        ) -> Result<VerifiableEntry, StoreError> {
            unimplemented!()
        }
        fn verifiable_tx(&self, _target_tx: u64, _source_tx: u64) -> Result<DualProof, StoreError> {
            unimplemented!()
        }
        fn reconnect(&self) -> Result<(), StoreError> {
            self.reconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn retries_once_after_session_expiry() {
        let store = FlakyStore::failing(1);
        let out = execute(&store, |s| s.try_get()).unwrap();
        assert_eq!(out, 42);
        assert_eq!(store.reconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_expiry_surfaces() {
        let store = FlakyStore::failing(2);
        let err = execute(&store, |s| s.try_get()).unwrap_err();
        assert!(matches!(err, StoreError::SessionExpired));
        assert_eq!(store.reconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_session_errors_surface_without_reconnect() {
        let store = FlakyStore::failing(0);
        let err = execute(&store, |_| {
            Err::<u64, _>(StoreError::NotFound("k".into()))
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.reconnects.load(Ordering::SeqCst), 0);
    }
}
