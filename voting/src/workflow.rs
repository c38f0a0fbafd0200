//! Registration, approval, and vote casting against a [`LedgerStore`].

use crate::ballot::{decode_vote, encode_vote, UNCAST};
use crate::error::VotingError;
use crate::voter::{RegisterRequest, Voter};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use verivote_store::{retry, Entry, LedgerStore, StoreError, WriteOp};
use verivote_types::keys::{ballot_key, citizen_key, voter_key};
use verivote_types::{RecordId, Timestamp};

/// Identifiers returned by registration. The caller must retain both;
/// there is no recovery path from a voter to their ballot.
#[derive(Clone, Debug, Serialize)]
pub struct Registration {
    pub voter_id: RecordId,
    pub ballot_id: RecordId,
}

/// A voter's progress through the one-way state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VoterStatus {
    pub approved_at: Option<Timestamp>,
    pub voted_at: Option<Timestamp>,
}

/// A ballot's current value plus its full committed history, oldest first.
/// The history is what makes the append-only property visible to a reader:
/// an uncast ballot shows `[0]`, a cast one `[0, code]`.
#[derive(Clone, Debug, Serialize)]
pub struct BallotView {
    pub ballot_id: String,
    pub vote: u16,
    pub history: Vec<u16>,
}

/// The voting workflow: all record-level operations over one ledger handle.
pub struct VotingWorkflow {
    store: Arc<dyn LedgerStore>,
    /// Admissible candidate codes, when the election restricts them.
    candidates: Option<Vec<u16>>,
}

impl VotingWorkflow {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            candidates: None,
        }
    }

    /// Restrict casting to the given candidate codes.
    pub fn with_candidates(mut self, candidates: Vec<u16>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub(crate) fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    /// Whether `code` is an admissible candidate under this election's
    /// configuration. Unrestricted elections admit every non-zero code.
    pub(crate) fn admits(&self, code: u16) -> bool {
        match &self.candidates {
            Some(candidates) => candidates.contains(&code),
            None => true,
        }
    }

    /// Register a voter: one atomic batch writing the voter record, the
    /// citizen alias, and an uncast ballot.
    ///
    /// Both identifiers are generated before anything is written, so an
    /// entropy failure leaves no partial state.
    pub fn register_voter(&self, request: &RegisterRequest) -> Result<Registration, VotingError> {
        request.validate()?;

        let alias = citizen_key(&request.citizen_id);
        match retry::execute(self.store(), |s| s.get(&alias, 0)) {
            Ok(_) => return Err(VotingError::AlreadyRegistered),
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let voter_id = RecordId::generate()?;
        let ballot_id = RecordId::generate()?;

        let voter = Voter {
            citizen_id: request.citizen_id.clone(),
            name: request.name.clone(),
            address: request.address.clone(),
            email: request.email.clone(),
            registered_at: Timestamp::now(),
            approved_at: None,
            voted_at: None,
        };
        let record = serde_json::to_vec(&voter)
            .map_err(|e| VotingError::Malformed(e.to_string()))?;

        let voter_k = voter_key(voter_id.as_str());
        let ops = [
            WriteOp::Put {
                key: voter_k.clone(),
                value: record,
            },
            WriteOp::Reference {
                key: alias,
                referenced_key: voter_k,
            },
            WriteOp::Put {
                key: ballot_key(ballot_id.as_str()),
                value: encode_vote(UNCAST),
            },
        ];
        let tx = retry::execute(self.store(), |s| s.atomic_batch(&ops))?;
        info!(voter_id = %voter_id, tx_id = tx, "voter registered");

        Ok(Registration {
            voter_id,
            ballot_id,
        })
    }

    /// Approve a registered voter. One-way: approving twice is an error.
    pub fn approve_voter(&self, id: &str) -> Result<(), VotingError> {
        let (canonical_key, mut voter) = self.resolve_voter(id)?;
        if voter.approved_at.is_some() {
            return Err(VotingError::AlreadyApproved);
        }
        voter.approved_at = Some(Timestamp::now());
        let record = serde_json::to_vec(&voter)
            .map_err(|e| VotingError::Malformed(e.to_string()))?;
        let ops = [WriteOp::Put {
            key: canonical_key,
            value: record,
        }];
        let tx = retry::execute(self.store(), |s| s.atomic_batch(&ops))?;
        info!(citizen_id = %voter.citizen_id, tx_id = tx, "voter approved");
        Ok(())
    }

    /// Cast a vote: mark the voter voted and write the candidate code onto
    /// the ballot, in one atomic batch.
    ///
    /// Preconditions are checked just before the batch is built; the batch
    /// is all-or-nothing but not conditional, so two concurrent casts
    /// against the same ballot can race through the check window.
    pub fn cast_vote(&self, id: &str, ballot_id: &str, vote: u16) -> Result<(), VotingError> {
        let mut violations = Vec::new();
        if id.trim().is_empty() {
            violations.push("voter id is required".to_string());
        }
        if ballot_id.trim().is_empty() {
            violations.push("ballot id is required".to_string());
        }
        if vote == UNCAST {
            violations.push("vote value must be non-zero".to_string());
        } else if !self.admits(vote) {
            violations.push(format!("unknown candidate code {vote}"));
        }
        VotingError::from_violations(violations)?;

        let (canonical_key, mut voter) = self.resolve_voter(id)?;
        if voter.approved_at.is_none() {
            return Err(VotingError::NotApproved);
        }
        if voter.voted_at.is_some() {
            return Err(VotingError::AlreadyVoted);
        }

        let ballot_k = ballot_key(ballot_id);
        let ballot_entry = match retry::execute(self.store(), |s| s.get(&ballot_k, 0)) {
            Ok(entry) => entry,
            Err(StoreError::NotFound(_)) => return Err(VotingError::NoSuchBallot),
            Err(e) => return Err(e.into()),
        };
        let current = decode_vote(&ballot_entry.value)
            .ok_or_else(|| VotingError::Malformed("ballot value is not two bytes".into()))?;
        if current != UNCAST {
            return Err(VotingError::AlreadyCast);
        }

        voter.voted_at = Some(Timestamp::now());
        let record = serde_json::to_vec(&voter)
            .map_err(|e| VotingError::Malformed(e.to_string()))?;
        // Always write back to the canonical voter key, even when the voter
        // was resolved through the citizen alias.
        let ops = [
            WriteOp::Put {
                key: canonical_key,
                value: record,
            },
            WriteOp::Put {
                key: ballot_k,
                value: encode_vote(vote),
            },
        ];
        let tx = retry::execute(self.store(), |s| s.atomic_batch(&ops))?;
        info!(tx_id = tx, "vote cast");
        Ok(())
    }

    /// A voter's approval and voting timestamps.
    pub fn voter_status(&self, id: &str) -> Result<VoterStatus, VotingError> {
        let (_, voter) = self.resolve_voter(id)?;
        Ok(VoterStatus {
            approved_at: voter.approved_at,
            voted_at: voter.voted_at,
        })
    }

    /// A ballot's current vote value.
    pub fn ballot(&self, ballot_id: &str) -> Result<u16, VotingError> {
        let key = ballot_key(ballot_id);
        let entry = match retry::execute(self.store(), |s| s.get(&key, 0)) {
            Ok(entry) => entry,
            Err(StoreError::NotFound(_)) => return Err(VotingError::NoSuchBallot),
            Err(e) => return Err(e.into()),
        };
        decode_vote(&entry.value)
            .ok_or_else(|| VotingError::Malformed("ballot value is not two bytes".into()))
    }

    /// Pick a uniformly random ballot and return it with its full history.
    /// `None` when no ballots exist yet.
    pub fn random_ballot(&self) -> Result<Option<BallotView>, VotingError> {
        let ballots = self.scan_all(verivote_types::keys::BALLOT_PREFIX.as_bytes())?;
        if ballots.is_empty() {
            return Ok(None);
        }
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf)
            .map_err(|e| VotingError::Malformed(format!("entropy source failed: {e}")))?;
        let pick = &ballots[(u64::from_be_bytes(buf) % ballots.len() as u64) as usize];

        let versions = retry::execute(self.store(), |s| s.history(&pick.key, 0, 0))?;
        let history: Vec<u16> = versions
            .iter()
            .filter_map(|entry| decode_vote(&entry.value))
            .collect();
        let vote = decode_vote(&pick.value)
            .ok_or_else(|| VotingError::Malformed("ballot value is not two bytes".into()))?;

        let ballot_id = verivote_types::keys::strip_prefix(
            &pick.key,
            verivote_types::keys::BALLOT_PREFIX,
        )
        .unwrap_or_default()
        .to_string();
        Ok(Some(BallotView {
            ballot_id,
            vote,
            history,
        }))
    }

    /// Resolve a voter by direct key, falling back to the citizen alias.
    /// Returns the canonical voter key alongside the record, so writes
    /// always land on `voter:<id>` no matter how the lookup arrived.
    fn resolve_voter(&self, id: &str) -> Result<(Vec<u8>, Voter), VotingError> {
        let direct = voter_key(id);
        let entry = match retry::execute(self.store(), |s| s.get(&direct, 0)) {
            Ok(entry) => entry,
            Err(StoreError::NotFound(_)) => {
                let alias = citizen_key(id);
                match retry::execute(self.store(), |s| s.get(&alias, 0)) {
                    Ok(entry) => entry,
                    Err(StoreError::NotFound(_)) => return Err(VotingError::NotRegistered),
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };
        let voter: Voter = serde_json::from_slice(&entry.value)
            .map_err(|e| VotingError::Malformed(e.to_string()))?;
        Ok((entry.key, voter))
    }

    /// Scan every latest entry under `prefix`, paging through the store.
    pub(crate) fn scan_all(&self, prefix: &[u8]) -> Result<Vec<Entry>, VotingError> {
        const PAGE: usize = 512;
        let mut out = Vec::new();
        let mut seek: Option<Vec<u8>> = None;
        loop {
            let page = retry::execute(self.store(), |s| {
                s.scan(prefix, PAGE, seek.as_deref(), false)
            })?;
            let full_page = page.len() == PAGE;
            if let Some(last) = page.last() {
                seek = Some(last.key.clone());
            }
            out.extend(page);
            if !full_page {
                break;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verivote_store_mem::MemoryLedger;

    fn workflow() -> VotingWorkflow {
        VotingWorkflow::new(Arc::new(MemoryLedger::new()))
    }

    fn request(citizen_id: &str) -> RegisterRequest {
        RegisterRequest {
            citizen_id: citizen_id.into(),
            name: "Ada Lovelace".into(),
            address: "12 Analytical Row".into(),
            email: "ada@example.org".into(),
        }
    }

    #[test]
    fn full_voting_lifecycle() {
        let wf = workflow();
        let reg = wf.register_voter(&request("C1")).unwrap();

        let status = wf.voter_status(reg.voter_id.as_str()).unwrap();
        assert!(status.approved_at.is_none());
        assert!(status.voted_at.is_none());

        // Casting before approval fails and writes nothing.
        let before = wf.store().current_checkpoint().unwrap().tx_id;
        let err = wf
            .cast_vote(reg.voter_id.as_str(), reg.ballot_id.as_str(), 2)
            .unwrap_err();
        assert!(matches!(err, VotingError::NotApproved));
        assert_eq!(wf.store().current_checkpoint().unwrap().tx_id, before);
        assert_eq!(wf.ballot(reg.ballot_id.as_str()).unwrap(), UNCAST);

        wf.approve_voter(reg.voter_id.as_str()).unwrap();
        wf.cast_vote(reg.voter_id.as_str(), reg.ballot_id.as_str(), 2)
            .unwrap();
        assert_eq!(wf.ballot(reg.ballot_id.as_str()).unwrap(), 2);

        let status = wf.voter_status(reg.voter_id.as_str()).unwrap();
        assert!(status.approved_at.is_some());
        assert!(status.voted_at.is_some());

        let err = wf
            .cast_vote(reg.voter_id.as_str(), reg.ballot_id.as_str(), 2)
            .unwrap_err();
        assert!(matches!(err, VotingError::AlreadyVoted));
        assert_eq!(wf.ballot(reg.ballot_id.as_str()).unwrap(), 2);
    }

    #[test]
    fn duplicate_registration_rejected_and_harmless() {
        let wf = workflow();
        let first = wf.register_voter(&request("C1")).unwrap();
        let before = wf.store().current_checkpoint().unwrap().tx_id;

        let err = wf.register_voter(&request("C1")).unwrap_err();
        assert!(matches!(err, VotingError::AlreadyRegistered));
        // Nothing was written and the first registration is intact.
        assert_eq!(wf.store().current_checkpoint().unwrap().tx_id, before);
        assert_eq!(wf.ballot(first.ballot_id.as_str()).unwrap(), UNCAST);
        assert!(wf.voter_status(first.voter_id.as_str()).is_ok());
    }

    #[test]
    fn registration_commits_one_transaction() {
        let wf = workflow();
        let before = wf.store().current_checkpoint().unwrap().tx_id;
        wf.register_voter(&request("C1")).unwrap();
        assert_eq!(wf.store().current_checkpoint().unwrap().tx_id, before + 1);
    }

    #[test]
    fn lookup_by_citizen_id_writes_to_canonical_key() {
        let wf = workflow();
        let reg = wf.register_voter(&request("C1")).unwrap();
        wf.approve_voter("C1").unwrap();
        wf.cast_vote("C1", reg.ballot_id.as_str(), 3).unwrap();

        // The canonical record, read directly, carries the updates.
        let entry = wf.store().get(&voter_key(reg.voter_id.as_str()), 0).unwrap();
        let voter: Voter = serde_json::from_slice(&entry.value).unwrap();
        assert!(voter.approved_at.is_some());
        assert!(voter.voted_at.is_some());
        // And no stray record appeared under the citizen key path.
        assert!(entry.referenced_by.is_none());
    }

    #[test]
    fn unknown_voter_is_not_registered() {
        let wf = workflow();
        assert!(matches!(
            wf.voter_status("nobody").unwrap_err(),
            VotingError::NotRegistered
        ));
        assert!(matches!(
            wf.cast_vote("nobody", "some-ballot", 1).unwrap_err(),
            VotingError::NotRegistered
        ));
    }

    #[test]
    fn missing_ballot_is_no_such_ballot() {
        let wf = workflow();
        let reg = wf.register_voter(&request("C1")).unwrap();
        wf.approve_voter(reg.voter_id.as_str()).unwrap();
        assert!(matches!(
            wf.cast_vote(reg.voter_id.as_str(), "bogus", 1).unwrap_err(),
            VotingError::NoSuchBallot
        ));
    }

    #[test]
    fn cast_onto_someone_elses_cast_ballot_is_already_cast() {
        let wf = workflow();
        let first = wf.register_voter(&request("C1")).unwrap();
        wf.approve_voter(first.voter_id.as_str()).unwrap();
        wf.cast_vote(first.voter_id.as_str(), first.ballot_id.as_str(), 1)
            .unwrap();

        let second = wf.register_voter(&request("C2")).unwrap();
        wf.approve_voter(second.voter_id.as_str()).unwrap();
        let err = wf
            .cast_vote(second.voter_id.as_str(), first.ballot_id.as_str(), 2)
            .unwrap_err();
        assert!(matches!(err, VotingError::AlreadyCast));
        // The original vote is unchanged.
        assert_eq!(wf.ballot(first.ballot_id.as_str()).unwrap(), 1);
    }

    #[test]
    fn double_approval_rejected() {
        let wf = workflow();
        let reg = wf.register_voter(&request("C1")).unwrap();
        wf.approve_voter(reg.voter_id.as_str()).unwrap();
        assert!(matches!(
            wf.approve_voter(reg.voter_id.as_str()).unwrap_err(),
            VotingError::AlreadyApproved
        ));
    }

    #[test]
    fn cast_validation_collects_all_violations() {
        let wf = workflow();
        let err = wf.cast_vote("", "", 0).unwrap_err();
        match err {
            VotingError::Validation(violations) => assert_eq!(violations.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn restricted_candidates_reject_unknown_codes() {
        let wf = VotingWorkflow::new(Arc::new(MemoryLedger::new())).with_candidates(vec![1, 2]);
        let reg = wf.register_voter(&request("C1")).unwrap();
        wf.approve_voter(reg.voter_id.as_str()).unwrap();

        let err = wf
            .cast_vote(reg.voter_id.as_str(), reg.ballot_id.as_str(), 9)
            .unwrap_err();
        assert!(matches!(err, VotingError::Validation(_)));
        wf.cast_vote(reg.voter_id.as_str(), reg.ballot_id.as_str(), 2)
            .unwrap();
    }

    #[test]
    fn random_ballot_exposes_history() {
        let wf = workflow();
        assert!(wf.random_ballot().unwrap().is_none());

        let reg = wf.register_voter(&request("C1")).unwrap();
        let view = wf.random_ballot().unwrap().unwrap();
        assert_eq!(view.ballot_id, reg.ballot_id.as_str());
        assert_eq!(view.vote, UNCAST);
        assert_eq!(view.history, vec![UNCAST]);

        wf.approve_voter(reg.voter_id.as_str()).unwrap();
        wf.cast_vote(reg.voter_id.as_str(), reg.ballot_id.as_str(), 4)
            .unwrap();
        let view = wf.random_ballot().unwrap().unwrap();
        assert_eq!(view.vote, 4);
        assert_eq!(view.history, vec![UNCAST, 4]);
    }
}
