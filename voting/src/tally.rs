//! Election tallying over full voter and ballot scans.

use crate::ballot::{decode_vote, UNCAST};
use crate::error::VotingError;
use crate::voter::Voter;
use crate::workflow::VotingWorkflow;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;
use verivote_types::keys::{BALLOT_PREFIX, VOTER_PREFIX};

/// Aggregate election counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TallyReport {
    /// Registered voters.
    pub registered: u64,
    /// Voters whose record marks them as having voted.
    pub voted: u64,
    /// Ballots carrying a non-sentinel value.
    pub ballots: u64,
    /// Cast ballots grouped by candidate code.
    pub results: BTreeMap<u16, u64>,
}

impl VotingWorkflow {
    /// Count registrations, votes, and per-candidate results.
    ///
    /// Malformed records are skipped and logged; one corrupt record must
    /// not hide the rest of the result.
    pub fn tally(&self) -> Result<TallyReport, VotingError> {
        let mut report = TallyReport::default();

        for entry in self.scan_all(VOTER_PREFIX.as_bytes())? {
            match serde_json::from_slice::<Voter>(&entry.value) {
                Ok(voter) => {
                    report.registered += 1;
                    if voter.voted_at.is_some() {
                        report.voted += 1;
                    }
                }
                Err(e) => {
                    warn!(
                        key = %String::from_utf8_lossy(&entry.key),
                        error = %e,
                        "skipping malformed voter record in tally"
                    );
                }
            }
        }

        for entry in self.scan_all(BALLOT_PREFIX.as_bytes())? {
            match decode_vote(&entry.value) {
                Some(UNCAST) => {}
                Some(code) if !self.admits(code) => {
                    warn!(
                        key = %String::from_utf8_lossy(&entry.key),
                        code,
                        "skipping ballot with out-of-election candidate code"
                    );
                }
                Some(code) => {
                    report.ballots += 1;
                    *report.results.entry(code).or_insert(0) += 1;
                }
                None => {
                    warn!(
                        key = %String::from_utf8_lossy(&entry.key),
                        "skipping malformed ballot record in tally"
                    );
                }
            }
        }

        Ok(report)
    }
}
