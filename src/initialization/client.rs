//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::DEFAULT_USER_AGENT;

/// Initializes the shared HTTP client.
///
/// Creates a `reqwest::Client` configured with:
/// - This crate's User-Agent
/// - A conservative overall timeout (per-call timeouts are applied on top
///   by the transport)
/// - Rustls TLS backend
///
/// The client pools connections internally and is shared across every
/// lookup via `Arc`; dropping the last clone closes the session.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout_seconds: u64) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(DEFAULT_USER_AGENT)
        .build()?;
    Ok(Arc::new(client))
}
