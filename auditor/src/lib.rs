//! Independent tamper auditing.
//!
//! An auditor is a third party that periodically asks the ledger for its
//! current state and a consistency proof against the last state the auditor
//! itself verified. It shares the voting service's proof verification but
//! none of its trust: a fresh auditor trusts only what it can prove.

pub mod client;
pub mod error;
pub mod verdict;

pub use client::{Auditor, LedgerClient};
pub use error::AuditError;
pub use verdict::{assess, Outcome, Verdict};
