//! RPC error types and their HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use verivote_store::StoreError;
use verivote_verify::VerifyError;
use verivote_voting::VotingError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Voting(#[from] VotingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The ledger failed proof verification. Clients should treat this as
    /// "stop trusting this server", not as a retryable failure.
    #[error("corrupted data: ledger failed verification")]
    Corrupted,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<VerifyError> for RpcError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::CorruptedData => RpcError::Corrupted,
            VerifyError::Store(inner) => RpcError::Store(inner),
            VerifyError::Cache(inner) => {
                RpcError::Store(StoreError::Backend(inner.to_string()))
            }
        }
    }
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Voting(e) => match e {
                VotingError::Validation(_) => StatusCode::BAD_REQUEST,
                VotingError::NotRegistered | VotingError::NoSuchBallot => StatusCode::NOT_FOUND,
                VotingError::NotApproved => StatusCode::FORBIDDEN,
                VotingError::AlreadyRegistered
                | VotingError::AlreadyApproved
                | VotingError::AlreadyVoted
                | VotingError::AlreadyCast => StatusCode::CONFLICT,
                VotingError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
                VotingError::Malformed(_)
                | VotingError::Id(_)
                | VotingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RpcError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            RpcError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::Corrupted => StatusCode::BAD_GATEWAY,
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
