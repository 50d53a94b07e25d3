//! Resolution endpoint definitions.
//!
//! An endpoint is one remote resolution service: its URL, the headers it
//! expects, and the HTTP verb it is queried with. Endpoints are tried in
//! list order; the list is immutable once constructed.

use crate::error_handling::ConfigError;

/// HTTP verb an endpoint is queried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    /// Query parameters carry the lookup key
    Get,
    /// A JSON body carries the lookup keys
    Post,
}

/// One remote resolution endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Destination URL
    pub url: String,
    /// Request headers sent with every call to this endpoint
    pub headers: Vec<(String, String)>,
    /// Verb used to query this endpoint
    pub verb: HttpVerb,
}

impl Endpoint {
    /// Creates an endpoint queried via GET with no extra headers.
    pub fn get(url: impl Into<String>) -> Self {
        Endpoint {
            url: url.into(),
            headers: Vec::new(),
            verb: HttpVerb::Get,
        }
    }

    /// Creates an endpoint queried via POST with no extra headers.
    pub fn post(url: impl Into<String>) -> Self {
        Endpoint {
            url: url.into(),
            headers: Vec::new(),
            verb: HttpVerb::Post,
        }
    }

    /// Adds a request header to the endpoint.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Ordered, static list of resolution endpoints.
///
/// The ordinal position of each endpoint defines failover order. The list is
/// never reordered at runtime, and an empty list is a construction-time
/// error: a resolver with nowhere to send queries is a configuration bug,
/// not a runtime condition.
#[derive(Debug, Clone)]
pub struct EndpointList(Vec<Endpoint>);

impl EndpointList {
    /// Builds an endpoint list, rejecting an empty one.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::EmptyEndpointList);
        }
        Ok(EndpointList(endpoints))
    }

    /// Iterates endpoints in failover order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.0.iter()
    }

    /// Number of endpoints in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an `EndpointList` cannot be empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Default DNS-over-HTTPS endpoints, tried in order.
pub fn default_doh_endpoints() -> EndpointList {
    EndpointList(vec![
        // Cloudflare
        Endpoint::get("https://1.1.1.1/dns-query").with_header("accept", "application/dns-json"),
        // Google
        Endpoint::get("https://8.8.8.8/resolve").with_header("accept", "application/x-javascript"),
    ])
}

/// Default bulk IP lookup endpoint.
pub fn default_ip_endpoints() -> EndpointList {
    EndpointList(vec![Endpoint::post("http://ip-api.com/batch")
        .with_header("Content-Type", "application/json")])
}
