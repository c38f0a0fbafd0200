//! HTTP client for the ledger's public state and proof endpoints, and the
//! audit loop built on top of it.

use crate::error::AuditError;
use crate::verdict::{assess, needs_proof, Outcome, Verdict};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tracing::{error, info};
use verivote_store::DualProof;
use verivote_types::{Checkpoint, RootDigest};
use verivote_verify::CheckpointStore;

/// Wire shape of the `/state` endpoint.
#[derive(Debug, Deserialize)]
struct StateResponse {
    tx_id: u64,
    /// Base64-encoded 32-byte state digest.
    tx_hash: String,
    #[serde(default)]
    signature: Option<String>,
}

impl StateResponse {
    fn into_checkpoint(self) -> Result<Checkpoint, AuditError> {
        let hash = BASE64
            .decode(&self.tx_hash)
            .map_err(|e| AuditError::BadResponse(format!("tx_hash base64: {e}")))?;
        let digest = RootDigest::from_slice(&hash)
            .ok_or_else(|| AuditError::BadResponse("tx_hash is not 32 bytes".into()))?;
        let mut checkpoint = Checkpoint::new(self.tx_id, digest);
        if let Some(sig) = self.signature {
            let sig = BASE64
                .decode(&sig)
                .map_err(|e| AuditError::BadResponse(format!("signature base64: {e}")))?;
            checkpoint.signature = Some(sig);
        }
        Ok(checkpoint)
    }
}

/// Client for the ledger's audit-facing HTTP endpoints.
pub struct LedgerClient {
    base_url: String,
    client: reqwest::Client,
}

impl LedgerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the server's current checkpoint claim. The claim is untrusted
    /// until a consistency proof against it verifies.
    pub async fn state(&self) -> Result<Checkpoint, AuditError> {
        let url = format!("{}/state", self.base_url);
        let resp: StateResponse = self.get_json(&url).await?;
        resp.into_checkpoint()
    }

    /// Fetch a consistency proof covering `(local_tx, server_tx]`.
    pub async fn consistency_proof(
        &self,
        server_tx: u64,
        local_tx: u64,
    ) -> Result<DualProof, AuditError> {
        let url = format!(
            "{}/verifiable-tx?server_tx={server_tx}&local_tx={local_tx}",
            self.base_url
        );
        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AuditError> {
        let resp = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuditError::BadResponse(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        Ok(resp.json().await?)
    }
}

/// Periodic auditor: fetches the server's state, verifies it extends the
/// last audited state, and records the new baseline.
pub struct Auditor<C: CheckpointStore> {
    client: LedgerClient,
    cache: C,
}

impl<C: CheckpointStore> Auditor<C> {
    pub fn new(client: LedgerClient, cache: C) -> Self {
        Self { client, cache }
    }

    /// Run one audit round.
    pub async fn run_once(&mut self) -> Result<Verdict, AuditError> {
        let local = self.cache.load()?;
        let server = self.client.state().await?;

        let proof = if needs_proof(local.as_ref(), &server) {
            let local_tx = local.as_ref().map(|l| l.tx_id).unwrap_or(0);
            Some(self.client.consistency_proof(server.tx_id, local_tx).await?)
        } else {
            None
        };

        let Outcome { verdict, persist } = assess(local.as_ref(), &server, proof.as_ref())?;

        match verdict {
            Verdict::FirstRun => {
                info!(tx_id = server.tx_id, "audit baseline recorded");
            }
            Verdict::TamperFree => {
                info!(tx_id = server.tx_id, "audit passed: ledger is tamper-free");
            }
            Verdict::Tampered => {
                error!(
                    server_tx = server.tx_id,
                    local_tx = local.as_ref().map(|l| l.tx_id).unwrap_or(0),
                    "audit FAILED: ledger state is inconsistent with audited history"
                );
            }
        }

        if let Some(checkpoint) = persist {
            self.cache.save(&checkpoint)?;
        }
        Ok(verdict)
    }
}
