//! HTTP API for the voting service.
//!
//! Exposes registration, approval, and vote casting, plus the audit
//! surface (`/state`, `/verifiable-tx`) that external auditors verify the
//! ledger through.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, AppState, RpcServer};
