//! Transport collaborator boundary.
//!
//! The engine never performs byte-level network I/O itself; it hands an
//! endpoint, query parameters or a JSON body, and a timeout to a
//! `Transport` implementation and gets back a status code, a header map,
//! and the body text. `HttpTransport` is the production implementation over
//! reqwest; tests substitute scripted implementations.

mod http;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Endpoint;

pub use http::HttpTransport;

/// One outbound call, fully described.
#[derive(Debug)]
pub struct TransportRequest<'a> {
    /// Destination endpoint (URL, headers, verb)
    pub endpoint: &'a Endpoint,
    /// Query parameters appended to the URL
    pub query: &'a [(String, String)],
    /// JSON body for POST endpoints
    pub body: Option<&'a serde_json::Value>,
    /// Per-call timeout
    pub timeout: Duration,
}

/// What came back from an endpoint, before any interpretation.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers with lower-cased names; unrepresentable values are
    /// dropped rather than failing the call
    pub headers: HashMap<String, String>,
    /// Body text
    pub body: String,
}

/// Network-level failure talking to one endpoint.
///
/// Transport errors never escape a lookup; the resolver logs them and moves
/// on to the next endpoint.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request construction or exchange failed (connect, timeout, TLS, ...)
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The exchange succeeded but the body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// Failure in a non-HTTP transport implementation
    #[error("transport failure: {0}")]
    Failed(String),
}

/// A collaborator that can exchange one request for one response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the call described by `request`.
    async fn call(&self, request: TransportRequest<'_>) -> Result<TransportResponse, TransportError>;
}
