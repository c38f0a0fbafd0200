//! Verified reads against an authenticated ledger.
//!
//! A client holds one small trusted [`Checkpoint`](verivote_types::Checkpoint)
//! and extends that trust to later ledger states by verifying inclusion and
//! consistency proofs, never by believing the server's claimed digests.

pub mod cache;
pub mod engine;
pub mod error;

pub use cache::{CacheError, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use engine::VerifiedReader;
pub use error::VerifyError;
