//! Authenticated ledger store abstraction.
//!
//! The rest of the workspace depends only on the [`LedgerStore`] trait; the
//! ledger itself (an append-only key-value store producing per-transaction
//! digests and proofs) is an external collaborator. `store_mem` provides an
//! embedded backend for development and testing.

pub mod entry;
pub mod error;
pub mod ledger;
pub mod proof;
pub mod retry;

pub use entry::{Entry, Reference};
pub use error::StoreError;
pub use ledger::{LedgerStore, VerifiableEntry, WriteOp};
pub use proof::{verify_dual_proof, verify_inclusion, DualProof, InclusionProof, TxMetadata};
