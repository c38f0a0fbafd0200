//! Embedded in-memory authenticated ledger.
//!
//! Implements [`LedgerStore`] with a real commitment scheme (per-transaction
//! entry Merkle trees chained through an accumulated linear hash), so
//! verified reads and consistency audits exercise genuine proofs. Used as
//! the development/testing backend; production deployments point the same
//! trait at an external ledger service.

mod ledger;

pub use ledger::MemoryLedger;
