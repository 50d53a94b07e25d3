//! Bulk IP geolocation lookups.
//!
//! IP addresses are looked up against a batch endpoint that accepts up to a
//! fixed number of keys per request, so input lists are partitioned into
//! chunks and each chunk is issued as one logical query: one token, one
//! quota passage, one POST. The endpoint advertises its remaining quota in
//! response headers, which feed the shared gate. Chunk results are
//! flattened back into a single sequence preserving input order; a failed
//! chunk yields absent entries for its own keys only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use serde::Deserialize;

use crate::config::{Endpoint, EndpointList, GeoConfig, HTTP_STATUS_OK};
use crate::error_handling::ConfigError;
use crate::rate_limit::{quota_from_headers, QuotaGate, TokenBucket};
use crate::resolver::LookupResult;
use crate::transport::{Transport, TransportRequest};

/// Fields requested from the batch endpoint for every IP.
const IP_FIELDS: &str = "status,countryCode,query";
/// Per-record status value marking a usable answer.
const RECORD_SUCCESS: &str = "success";

/// One record of a batch geolocation reply.
#[derive(Debug, Deserialize)]
struct GeoRecord {
    /// Per-record outcome ("success" or "fail")
    #[serde(default)]
    status: String,
    /// Two-letter country code; absent on failed records
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    /// The IP the record answers for
    #[serde(default)]
    query: String,
}

/// Rate-governed bulk IP resolver.
///
/// Owns its own token bucket and quota gate, sized for the batch endpoint's
/// much stricter budget; chunking and flattening are internal, so callers
/// see one ordered result per input IP.
pub struct IpBatchResolver {
    transport: Arc<dyn Transport>,
    endpoints: EndpointList,
    bucket: TokenBucket,
    quota: QuotaGate,
    chunk_size: usize,
    timeout: Duration,
}

impl IpBatchResolver {
    /// Builds a bulk resolver over the given transport.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for a zero chunk size or any invalid gate
    /// parameter; an empty endpoint list is rejected when the list is
    /// constructed.
    pub fn new(config: GeoConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        if config.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(IpBatchResolver {
            transport,
            bucket: TokenBucket::new(config.rate, config.burst)?,
            quota: QuotaGate::new(&config.quota)?,
            endpoints: config.endpoints,
            chunk_size: config.chunk_size,
            timeout: config.timeout,
        })
    }

    /// Looks up country codes for a list of IPs.
    ///
    /// Returns one result per input IP, in input order; an IP whose chunk
    /// failed, or whose record came back unsuccessful, yields an absent
    /// entry.
    pub async fn lookup(&self, ips: &[String]) -> Vec<LookupResult> {
        let mut results: Vec<LookupResult> = ips
            .iter()
            .map(|ip| LookupResult {
                key: ip.clone(),
                answers: None,
            })
            .collect();

        let mut in_flight: FuturesUnordered<_> = ips
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(chunk_index, chunk)| async move {
                (chunk_index, self.lookup_chunk(chunk).await)
            })
            .collect();

        while let Some((chunk_index, codes)) = in_flight.next().await {
            let offset = chunk_index * self.chunk_size;
            for (i, code) in codes.into_iter().enumerate() {
                results[offset + i].answers = code.map(|c| vec![c]);
            }
        }
        results
    }

    /// Issues one chunk as one logical query: one token, one quota passage,
    /// then the endpoint walk.
    async fn lookup_chunk(&self, chunk: &[String]) -> Vec<Option<String>> {
        self.bucket.acquire().await;
        self.quota.acquire().await;

        let body = serde_json::Value::from(
            chunk
                .iter()
                .map(|ip| serde_json::Value::from(ip.as_str()))
                .collect::<Vec<_>>(),
        );
        let query = [("fields".to_string(), IP_FIELDS.to_string())];

        for endpoint in self.endpoints.iter() {
            match self.query_endpoint(endpoint, &query, &body).await {
                Some(by_ip) => {
                    return chunk
                        .iter()
                        .map(|ip| by_ip.get(ip.as_str()).cloned())
                        .collect();
                }
                None => continue,
            }
        }
        log::warn!("bulk lookup failed for a chunk of {} IPs", chunk.len());
        vec![None; chunk.len()]
    }

    /// One POST against one endpoint; `None` advances the walk.
    async fn query_endpoint(
        &self,
        endpoint: &Endpoint,
        query: &[(String, String)],
        body: &serde_json::Value,
    ) -> Option<HashMap<String, String>> {
        let request = TransportRequest {
            endpoint,
            query,
            body: Some(body),
            timeout: self.timeout,
        };
        let response = match self.transport.call(request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Err: {e} for {}", endpoint.url);
                return None;
            }
        };
        if response.status != HTTP_STATUS_OK {
            log::info!("Using {}; Response: {}", endpoint.url, response.status);
            return None;
        }

        if let Some((remaining, reset_after)) = quota_from_headers(&response.headers) {
            self.quota.observe(remaining, reset_after).await;
        }

        let records: Vec<GeoRecord> = match serde_json::from_str(&response.body) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("unparseable reply from {}: {e}", endpoint.url);
                return None;
            }
        };

        Some(
            records
                .into_iter()
                .filter(|record| record.status == RECORD_SUCCESS)
                .filter_map(|record| record.country_code.map(|code| (record.query, code)))
                .collect(),
        )
    }

    /// Remaining server-advertised quota as last tracked.
    pub async fn quota_remaining(&self) -> u32 {
        self.quota.remaining().await
    }
}

impl std::fmt::Debug for IpBatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpBatchResolver")
            .field("endpoints", &self.endpoints.len())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::config::QuotaSettings;
    use crate::transport::{TransportError, TransportResponse};

    use super::*;

    /// Transport that echoes a country per IP and counts chunk queries.
    struct EchoTransport {
        chunk_queries: AtomicUsize,
        fail: bool,
    }

    impl EchoTransport {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(EchoTransport {
                chunk_queries: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn call(
            &self,
            request: TransportRequest<'_>,
        ) -> Result<TransportResponse, TransportError> {
            self.chunk_queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransportError::Failed("connection reset".into()));
            }
            let ips: Vec<String> =
                serde_json::from_value(request.body.expect("bulk query carries a body").clone())
                    .unwrap();
            let records: Vec<serde_json::Value> = ips
                .iter()
                .map(|ip| {
                    if ip.starts_with("198.51.100.") {
                        // TEST-NET-2 stands in for unresolvable space
                        serde_json::json!({"status": "fail", "query": ip})
                    } else {
                        serde_json::json!({
                            "status": "success",
                            "countryCode": "US",
                            "query": ip,
                        })
                    }
                })
                .collect();
            let mut headers = HashMap::new();
            headers.insert("x-rl".to_string(), "14".to_string());
            headers.insert("x-ttl".to_string(), "55".to_string());
            Ok(TransportResponse {
                status: 200,
                headers,
                body: serde_json::to_string(&records).unwrap(),
            })
        }
    }

    fn fast_config(chunk_size: usize) -> GeoConfig {
        GeoConfig {
            rate: 1000.0,
            burst: 1000.0,
            chunk_size,
            quota: QuotaSettings {
                seed_remaining: 1000,
                seed_reset: Duration::from_secs(1),
                ceiling: 1000,
            },
            ..GeoConfig::default()
        }
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let transport = EchoTransport::new(false);
        let result = IpBatchResolver::new(fast_config(0), transport);
        assert!(matches!(result, Err(ConfigError::ZeroChunkSize)));
    }

    #[tokio::test]
    async fn test_chunking_issues_expected_query_count() {
        let transport = EchoTransport::new(false);
        let resolver = IpBatchResolver::new(fast_config(99), Arc::clone(&transport) as Arc<dyn Transport>).unwrap();

        let ips: Vec<String> = (0..250).map(|i| format!("203.0.113.{}", i % 250)).collect();
        let results = resolver.lookup(&ips).await;

        // 250 keys at 99 per chunk = 3 logical queries
        assert_eq!(transport.chunk_queries.load(Ordering::SeqCst), 3);
        assert_eq!(results.len(), 250);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.key, ips[i], "flattened output must preserve order");
            assert_eq!(result.answers, Some(vec!["US".to_string()]));
        }
    }

    #[tokio::test]
    async fn test_failed_records_are_absent_but_positioned() {
        let transport = EchoTransport::new(false);
        let resolver = IpBatchResolver::new(fast_config(2), Arc::clone(&transport) as Arc<dyn Transport>).unwrap();

        let ips: Vec<String> = vec![
            "203.0.113.7".into(),
            "198.51.100.9".into(),
            "203.0.113.8".into(),
        ];
        let results = resolver.lookup(&ips).await;

        assert_eq!(results[0].answers, Some(vec!["US".to_string()]));
        assert_eq!(results[1].answers, None);
        assert_eq!(results[2].answers, Some(vec!["US".to_string()]));
    }

    #[tokio::test]
    async fn test_transport_failure_yields_absent_chunk() {
        let transport = EchoTransport::new(true);
        let resolver = IpBatchResolver::new(fast_config(99), Arc::clone(&transport) as Arc<dyn Transport>).unwrap();

        let ips: Vec<String> = vec!["203.0.113.7".into(), "203.0.113.8".into()];
        let results = resolver.lookup(&ips).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.answers.is_none()));
    }

    #[tokio::test]
    async fn test_quota_headers_feed_the_gate() {
        let transport = EchoTransport::new(false);
        let resolver = IpBatchResolver::new(fast_config(99), Arc::clone(&transport) as Arc<dyn Transport>).unwrap();

        resolver.lookup(&["203.0.113.7".to_string()]).await;
        assert_eq!(resolver.quota_remaining().await, 14);
    }
}
