//! Request handlers and their wire types.
//!
//! Every request and response is an explicitly named type; nothing embeds
//! or inherits another endpoint's shape.

use crate::error::RpcError;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use verivote_store::{DualProof, StoreError};
use verivote_types::keys::{ballot_key, citizen_key, voter_key};
use verivote_voting::{decode_vote, RegisterRequest, Voter, VotingError};

// ── Registration ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterVoterRequest {
    pub citizen_id: String,
    pub name: String,
    pub address: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct RegisterVoterResponse {
    pub voter_id: String,
    pub ballot_id: String,
}

pub async fn register_voter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterVoterRequest>,
) -> Result<Json<RegisterVoterResponse>, RpcError> {
    let registration = state.workflow.register_voter(&RegisterRequest {
        citizen_id: req.citizen_id,
        name: req.name,
        address: req.address,
        email: req.email,
    })?;
    Ok(Json(RegisterVoterResponse {
        voter_id: registration.voter_id.to_string(),
        ballot_id: registration.ballot_id.to_string(),
    }))
}

#[derive(Deserialize)]
pub struct ApproveVoterRequest {
    pub voter_id: String,
}

pub async fn approve_voter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApproveVoterRequest>,
) -> Result<StatusCode, RpcError> {
    state.workflow.approve_voter(&req.voter_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Voting ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CastVoteRequest {
    pub voter_id: String,
    pub ballot_id: String,
    pub vote: u16,
}

pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CastVoteRequest>,
) -> Result<StatusCode, RpcError> {
    state
        .workflow
        .cast_vote(&req.voter_id, &req.ballot_id, req.vote)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Status and ballots ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VoterStatusQuery {
    pub voter_id: String,
}

#[derive(Serialize)]
pub struct VoterStatusResponse {
    pub approved: bool,
    pub voted: bool,
}

/// Status reads go through the verified-read engine: the server proves its
/// own ledger's integrity on every read it serves.
pub async fn voter_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoterStatusQuery>,
) -> Result<Json<VoterStatusResponse>, RpcError> {
    let entry = match state.reader.verified_get(&voter_key(&query.voter_id)) {
        Ok(entry) => entry,
        Err(verivote_verify::VerifyError::Store(StoreError::NotFound(_))) => state
            .reader
            .verified_get(&citizen_key(&query.voter_id))
            .map_err(|e| match e {
                verivote_verify::VerifyError::Store(StoreError::NotFound(_)) => {
                    RpcError::Voting(VotingError::NotRegistered)
                }
                other => other.into(),
            })?,
        Err(e) => return Err(e.into()),
    };
    let voter: Voter = serde_json::from_slice(&entry.value)
        .map_err(|e| RpcError::Voting(VotingError::Malformed(e.to_string())))?;
    Ok(Json(VoterStatusResponse {
        approved: voter.approved_at.is_some(),
        voted: voter.voted_at.is_some(),
    }))
}

#[derive(Deserialize)]
pub struct BallotQuery {
    pub ballot_id: String,
}

#[derive(Serialize)]
pub struct BallotResponse {
    pub vote: u16,
}

pub async fn ballot(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BallotQuery>,
) -> Result<Json<BallotResponse>, RpcError> {
    let entry = state
        .reader
        .verified_get(&ballot_key(&query.ballot_id))
        .map_err(|e| match e {
            verivote_verify::VerifyError::Store(StoreError::NotFound(_)) => {
                RpcError::Voting(VotingError::NoSuchBallot)
            }
            other => other.into(),
        })?;
    let vote = decode_vote(&entry.value)
        .ok_or_else(|| RpcError::Voting(VotingError::Malformed("ballot bytes".into())))?;
    Ok(Json(BallotResponse { vote }))
}

#[derive(Serialize)]
pub struct RandomBallotResponse {
    pub ballot_id: String,
    pub vote: u16,
    /// All committed values oldest first; shows the append-only history.
    pub history: Vec<u16>,
}

pub async fn random_ballot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RandomBallotResponse>, RpcError> {
    let view = state
        .workflow
        .random_ballot()?
        .ok_or(RpcError::Voting(VotingError::NoSuchBallot))?;
    Ok(Json(RandomBallotResponse {
        ballot_id: view.ballot_id,
        vote: view.vote,
        history: view.history,
    }))
}

// ── Audit surface ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StateResponse {
    pub tx_id: u64,
    /// Base64-encoded state digest.
    pub tx_hash: String,
}

pub async fn ledger_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StateResponse>, RpcError> {
    let checkpoint = state.store.current_checkpoint()?;
    Ok(Json(StateResponse {
        tx_id: checkpoint.tx_id,
        tx_hash: BASE64.encode(checkpoint.digest.as_bytes()),
    }))
}

#[derive(Deserialize)]
pub struct VerifiableTxQuery {
    pub server_tx: u64,
    #[serde(default)]
    pub local_tx: u64,
}

pub async fn verifiable_tx(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifiableTxQuery>,
) -> Result<Json<DualProof>, RpcError> {
    let proof = state.store.verifiable_tx(query.server_tx, query.local_tx)?;
    Ok(Json(proof))
}

// ── Stats ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub registered: u64,
    pub voted: u64,
    pub ballots: u64,
    pub results: BTreeMap<u16, u64>,
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, RpcError> {
    let report = state.workflow.tally()?;
    Ok(Json(StatsResponse {
        registered: report.registered,
        voted: report.voted,
        ballots: report.ballots,
        results: report.results,
    }))
}
