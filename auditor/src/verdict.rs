//! The audit decision, kept pure so it can be tested against an in-memory
//! ledger without any transport.

use crate::error::AuditError;
use verivote_store::{verify_dual_proof, DualProof};
use verivote_types::Checkpoint;

/// Result of one audit round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No prior audited state existed; the server's current state was
    /// recorded as the baseline for future rounds.
    FirstRun,
    /// The server's state is a consistent extension of the audited baseline.
    TamperFree,
    /// The server's state contradicts the audited baseline.
    Tampered,
}

/// A verdict plus the checkpoint to persist, if any.
///
/// A checkpoint is persisted only when it verified and strictly advances the
/// baseline; a tampered or stale server can never rewind the audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub persist: Option<Checkpoint>,
}

/// Whether auditing `server` against `local` requires a consistency proof.
pub fn needs_proof(local: Option<&Checkpoint>, server: &Checkpoint) -> bool {
    match local {
        Some(l) if l.tx_id > 0 => server.tx_id > l.tx_id,
        _ => false,
    }
}

/// Judge the server's claimed state against the last audited checkpoint.
///
/// `proof` must cover `(local, server]` whenever [`needs_proof`] says so;
/// supplying none in that case is an [`AuditError::MissingProof`], not a
/// tamper verdict, since a missing proof is a transport failure rather than
/// evidence.
pub fn assess(
    local: Option<&Checkpoint>,
    server: &Checkpoint,
    proof: Option<&DualProof>,
) -> Result<Outcome, AuditError> {
    let local = match local {
        Some(l) if l.tx_id > 0 => l,
        _ => {
            return Ok(Outcome {
                verdict: Verdict::FirstRun,
                persist: Some(server.clone()),
            })
        }
    };

    // A server claiming fewer transactions than we audited has truncated
    // its history.
    if server.tx_id < local.tx_id {
        return Ok(Outcome {
            verdict: Verdict::Tampered,
            persist: None,
        });
    }

    if server.tx_id == local.tx_id {
        let verdict = if server.digest == local.digest {
            Verdict::TamperFree
        } else {
            Verdict::Tampered
        };
        return Ok(Outcome {
            verdict,
            persist: None,
        });
    }

    let proof = proof.ok_or(AuditError::MissingProof)?;
    if verify_dual_proof(
        proof,
        local.tx_id,
        server.tx_id,
        &local.digest,
        &server.digest,
    ) {
        Ok(Outcome {
            verdict: Verdict::TamperFree,
            persist: Some(server.clone()),
        })
    } else {
        Ok(Outcome {
            verdict: Verdict::Tampered,
            persist: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verivote_store::{LedgerStore, WriteOp};
    use verivote_store_mem::MemoryLedger;
    use verivote_types::RootDigest;

    fn put(key: &[u8], value: &[u8]) -> WriteOp {
        WriteOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    fn ledger_with(n: u64) -> MemoryLedger {
        let ledger = MemoryLedger::new();
        for i in 0..n {
            ledger
                .atomic_batch(&[put(format!("k{i}").as_bytes(), b"v")])
                .unwrap();
        }
        ledger
    }

    #[test]
    fn first_run_records_baseline() {
        let ledger = ledger_with(2);
        let server = ledger.current_checkpoint().unwrap();
        let out = assess(None, &server, None).unwrap();
        assert_eq!(out.verdict, Verdict::FirstRun);
        assert_eq!(out.persist, Some(server));
    }

    #[test]
    fn genesis_local_counts_as_first_run() {
        let ledger = ledger_with(1);
        let server = ledger.current_checkpoint().unwrap();
        let out = assess(Some(&Checkpoint::genesis()), &server, None).unwrap();
        assert_eq!(out.verdict, Verdict::FirstRun);
    }

    #[test]
    fn consistent_extension_is_tamper_free_and_advances() {
        let ledger = ledger_with(2);
        let local = ledger.current_checkpoint().unwrap();
        ledger.atomic_batch(&[put(b"k2", b"v")]).unwrap();
        ledger.atomic_batch(&[put(b"k3", b"v")]).unwrap();
        let server = ledger.current_checkpoint().unwrap();

        assert!(needs_proof(Some(&local), &server));
        let proof = ledger.verifiable_tx(server.tx_id, local.tx_id).unwrap();
        let out = assess(Some(&local), &server, Some(&proof)).unwrap();
        assert_eq!(out.verdict, Verdict::TamperFree);
        assert_eq!(out.persist, Some(server));
    }

    #[test]
    fn unchanged_state_is_tamper_free_without_proof() {
        let ledger = ledger_with(3);
        let state = ledger.current_checkpoint().unwrap();
        assert!(!needs_proof(Some(&state), &state));
        let out = assess(Some(&state), &state, None).unwrap();
        assert_eq!(out.verdict, Verdict::TamperFree);
        assert!(out.persist.is_none());
    }

    #[test]
    fn same_height_different_digest_is_tampered() {
        let ledger = ledger_with(3);
        let local = ledger.current_checkpoint().unwrap();
        let server = Checkpoint::new(local.tx_id, RootDigest::new([9u8; 32]));
        let out = assess(Some(&local), &server, None).unwrap();
        assert_eq!(out.verdict, Verdict::Tampered);
        assert!(out.persist.is_none());
    }

    #[test]
    fn truncated_history_is_tampered() {
        let ledger = ledger_with(5);
        let local = ledger.current_checkpoint().unwrap();
        let server = Checkpoint::new(2, RootDigest::new([1u8; 32]));
        let out = assess(Some(&local), &server, None).unwrap();
        assert_eq!(out.verdict, Verdict::Tampered);
    }

    #[test]
    fn rewritten_chain_is_tampered() {
        let ledger = ledger_with(2);
        let local = ledger.current_checkpoint().unwrap();
        ledger.atomic_batch(&[put(b"k2", b"v")]).unwrap();
        let server = ledger.current_checkpoint().unwrap();
        let mut proof = ledger.verifiable_tx(server.tx_id, local.tx_id).unwrap();
        // Rewrite the appended transaction's payload digest; the chain no
        // longer reaches the server's claimed digest.
        proof.chain[0].entries_digest = RootDigest::new([0xEE; 32]);

        let out = assess(Some(&local), &server, Some(&proof)).unwrap();
        assert_eq!(out.verdict, Verdict::Tampered);
        assert!(out.persist.is_none());
    }

    #[test]
    fn missing_required_proof_is_an_error() {
        let ledger = ledger_with(1);
        let local = ledger.current_checkpoint().unwrap();
        ledger.atomic_batch(&[put(b"x", b"v")]).unwrap();
        let server = ledger.current_checkpoint().unwrap();
        let err = assess(Some(&local), &server, None).unwrap_err();
        assert!(matches!(err, AuditError::MissingProof));
    }
}
