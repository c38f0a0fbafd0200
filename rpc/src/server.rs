//! Axum-based HTTP server.

use crate::error::RpcError;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use verivote_store::LedgerStore;
use verivote_verify::{CheckpointStore, VerifiedReader};
use verivote_voting::VotingWorkflow;

/// Everything the handlers share: the workflow for writes and scans, the
/// raw store for the audit surface, and a verified reader for the reads
/// the server proves to itself.
pub struct AppState {
    pub workflow: VotingWorkflow,
    pub store: Arc<dyn LedgerStore>,
    pub reader: VerifiedReader<Box<dyn CheckpointStore>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        workflow: VotingWorkflow,
        checkpoints: Box<dyn CheckpointStore>,
    ) -> Self {
        let reader = VerifiedReader::new(store.clone(), checkpoints);
        Self {
            workflow,
            store,
            reader,
        }
    }
}

/// Build the full API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register-voter", post(handlers::register_voter))
        .route("/approve-voter", post(handlers::approve_voter))
        .route("/vote", post(handlers::cast_vote))
        .route("/voter-status", get(handlers::voter_status))
        .route("/ballot", get(handlers::ballot))
        .route("/ballot/random", get(handlers::random_ballot))
        .route("/state", get(handlers::ledger_state))
        .route("/verifiable-tx", get(handlers::verifiable_tx))
        .route("/stats", get(handlers::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The HTTP server, configured with a port and shared state.
pub struct RpcServer {
    pub port: u16,
    pub state: Arc<AppState>,
}

impl RpcServer {
    pub fn new(port: u16, state: Arc<AppState>) -> Self {
        Self { port, state }
    }

    /// Bind and serve until shut down.
    pub async fn start(&self) -> Result<(), RpcError> {
        let app = router(self.state.clone());
        let addr = format!("0.0.0.0:{}", self.port);
        info!("rpc server listening on {addr}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::InvalidRequest(format!("bind {addr}: {e}")))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| RpcError::InvalidRequest(format!("serve: {e}")))?;
        Ok(())
    }
}
