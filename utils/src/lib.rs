//! Shared utilities for the verivote services.

pub mod logging;

pub use logging::init_tracing;
