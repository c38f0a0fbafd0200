//! The voting transaction workflow.
//!
//! Every record lives in an authenticated append-only ledger under a stable
//! key prefix: `voter:<id>` holds the voter record, `citizen:<id>` is an
//! alias pointing at it, and `ballot:<id>` holds the two-byte vote value.
//! State machines are one-way: a voter goes registered, approved, voted; a
//! ballot goes uncast (the `0` sentinel) to cast exactly once.

pub mod ballot;
pub mod error;
pub mod tally;
pub mod voter;
pub mod workflow;

pub use ballot::{decode_vote, encode_vote, UNCAST};
pub use error::VotingError;
pub use tally::TallyReport;
pub use voter::{RegisterRequest, Voter};
pub use workflow::{BallotView, Registration, VoterStatus, VotingWorkflow};
