//! Fundamental types for verivote.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: digests, checkpoints, record identifiers, timestamps, and the
//! ledger key namespace.

pub mod checkpoint;
pub mod digest;
pub mod id;
pub mod keys;
pub mod time;

pub use checkpoint::Checkpoint;
pub use digest::RootDigest;
pub use id::{IdError, RecordId};
pub use time::Timestamp;
