//! HTTP transport over reqwest.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::HttpVerb;

use super::{Transport, TransportError, TransportRequest, TransportResponse};

/// Production transport: drives a shared reqwest client.
///
/// The client is built once (see `initialization::init_client`) and shared
/// across every lookup; reqwest pools connections internally, so dropping
/// the last clone of the `Arc` is what closes the session.
#[derive(Clone)]
pub struct HttpTransport {
    client: Arc<reqwest::Client>,
}

impl HttpTransport {
    /// Wraps a shared client.
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        HttpTransport { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: TransportRequest<'_>) -> Result<TransportResponse, TransportError> {
        let endpoint = request.endpoint;
        let mut builder = match endpoint.verb {
            HttpVerb::Get => self.client.get(&endpoint.url),
            HttpVerb::Post => self.client.post(&endpoint.url),
        };
        for (name, value) in &endpoint.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(request.query);
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.timeout(request.timeout).send().await?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }
        let body = response.text().await.map_err(TransportError::Body)?;

        log::debug!("{} answered {}", endpoint.url, status);
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
