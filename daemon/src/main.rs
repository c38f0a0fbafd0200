//! verivote daemon — entry point for the voting service and the auditor.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use verivote_auditor::{Auditor, LedgerClient, Verdict};
use verivote_rpc::{AppState, RpcServer};
use verivote_store::LedgerStore;
use verivote_store_mem::MemoryLedger;
use verivote_verify::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use verivote_voting::VotingWorkflow;

#[derive(Parser)]
#[command(name = "verivote-daemon", about = "verivote voting service daemon")]
struct Cli {
    /// HTTP port for the voting service.
    #[arg(long, default_value_t = 8080, env = "VERIVOTE_PORT")]
    port: u16,

    /// Admissible candidate codes (comma-separated, e.g. "1,2,3").
    /// Empty means any non-zero code is accepted.
    #[arg(long, env = "VERIVOTE_CANDIDATES", value_delimiter = ',')]
    candidates: Vec<u16>,

    /// File the server persists its verified-read checkpoint in.
    /// Unset means in-memory only.
    #[arg(long, env = "VERIVOTE_CHECKPOINT_FILE")]
    checkpoint_file: Option<PathBuf>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the voting service.
    Serve,
    /// Audit a running service for ledger tampering.
    Audit {
        /// Base URL of the service to audit.
        #[arg(long, default_value = "http://127.0.0.1:8080", env = "VERIVOTE_AUDIT_URL")]
        url: String,

        /// File the auditor persists its baseline checkpoint in.
        #[arg(long, default_value = "./verivote_audit.json")]
        state_file: PathBuf,

        /// Seconds between audit rounds. `0` runs a single round and exits.
        #[arg(long, default_value_t = 0)]
        interval: u64,
    },
}

/// Service settings loadable from a TOML file.
#[derive(Debug, Default, Deserialize)]
struct ServiceConfig {
    port: Option<u16>,
    candidates: Option<Vec<u16>>,
    checkpoint_file: Option<PathBuf>,
}

impl ServiceConfig {
    fn load(path: &PathBuf) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ServiceConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("Loaded config from {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {e}, using CLI defaults");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {e}, using CLI defaults",
                    path.display()
                );
                None
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    verivote_utils::init_tracing();

    let cli = Cli::parse();

    let file_config = cli
        .config
        .as_ref()
        .and_then(ServiceConfig::load)
        .unwrap_or_default();

    // CLI flags and env vars override file settings.
    let port = if cli.port != 8080 {
        cli.port
    } else {
        file_config.port.unwrap_or(cli.port)
    };
    let candidates = if cli.candidates.is_empty() {
        file_config.candidates.unwrap_or_default()
    } else {
        cli.candidates.clone()
    };
    let checkpoint_file = cli.checkpoint_file.clone().or(file_config.checkpoint_file);

    match cli.command {
        Command::Serve => {
            let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedger::new());
            let mut workflow = VotingWorkflow::new(store.clone());
            if !candidates.is_empty() {
                tracing::info!("restricting candidate codes to {candidates:?}");
                workflow = workflow.with_candidates(candidates);
            }

            let checkpoints: Box<dyn CheckpointStore> = match checkpoint_file {
                Some(path) => Box::new(FileCheckpointStore::new(path)),
                None => Box::new(MemoryCheckpointStore::new()),
            };

            let state = Arc::new(AppState::new(store, workflow, checkpoints));
            tracing::info!("Starting verivote service on port {port}");
            RpcServer::new(port, state).start().await?;
        }
        Command::Audit {
            url,
            state_file,
            interval,
        } => {
            let client = LedgerClient::new(&url);
            let cache = FileCheckpointStore::new(&state_file);
            let mut auditor = Auditor::new(client, cache);

            loop {
                let verdict = auditor.run_once().await?;
                if verdict == Verdict::Tampered {
                    anyhow::bail!("ledger at {url} failed the consistency audit");
                }
                if interval == 0 {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            }
        }
    }

    Ok(())
}
