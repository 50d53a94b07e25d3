//! Single-key resolution with endpoint failover.
//!
//! A lookup consults the cache, passes the token bucket and the quota gate,
//! then walks the endpoint list in order until one endpoint yields a usable
//! answer or the list is exhausted. The first success wins; exhaustion
//! resolves to an absent answer, never to an error. Every outcome is
//! memoized before it is returned.

mod batch;
mod wire;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::cache::{CacheKey, CachedAnswer, ResolutionCache};
use crate::config::{
    Endpoint, EndpointList, QueryOptions, ResolverConfig, DNS_STATUS_NOERROR, HTTP_STATUS_OK,
    HTTP_STATUS_TOO_MANY_REQUESTS, QUOTA_RESET_HEADER, RATE_LIMIT_DEFAULT_BACKOFF,
    RETRY_AFTER_HEADER,
};
use crate::error_handling::{ConfigError, ErrorType, InfoType, LookupStats};
use crate::rate_limit::{quota_from_headers, QuotaGate, TokenBucket};
use crate::transport::{Transport, TransportRequest};

pub use batch::LookupResult;

/// Concurrent, rate-governed DoH resolver.
///
/// One instance owns one token bucket, one quota gate, and one resolution
/// cache; every lookup and batch spawned from it shares all three for the
/// lifetime of the instance. The endpoint list is immutable configuration.
pub struct Resolver {
    transport: Arc<dyn Transport>,
    endpoints: EndpointList,
    bucket: TokenBucket,
    quota: QuotaGate,
    cache: ResolutionCache,
    retry_codes: Vec<u16>,
    default_timeout: Duration,
    stats: Arc<LookupStats>,
}

impl Resolver {
    /// Builds a resolver over the given transport.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an empty endpoint list, a non-positive
    /// rate, a sub-token burst capacity, a zero cache size, or a quota
    /// ceiling below the gate's low-water mark. Nothing is validated later;
    /// a constructed resolver cannot fail fatally.
    pub fn new(config: ResolverConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Ok(Resolver {
            transport,
            bucket: TokenBucket::new(config.rate, config.burst)?,
            quota: QuotaGate::new(&config.quota)?,
            cache: ResolutionCache::new(config.cache_size)?,
            endpoints: config.endpoints,
            retry_codes: config.retry_codes,
            default_timeout: config.timeout,
            stats: Arc::new(LookupStats::new()),
        })
    }

    /// Resolves one key.
    ///
    /// Returns the answer strings in endpoint order, or `None` when every
    /// endpoint was exhausted without a usable answer. A memoized key is
    /// answered from the cache without touching the rate gates or the
    /// network.
    pub async fn resolve(&self, key: &str, options: &QueryOptions) -> Option<Vec<String>> {
        let cache_key = CacheKey::new(key, options.record_type);
        if let Some(cached) = self.cache.get(&cache_key) {
            self.stats.increment_info(InfoType::CacheHit);
            log::debug!("cache hit for {key} ({})", options.record_type);
            return cached.into_answers();
        }

        self.bucket.acquire().await;
        if self.quota.acquire().await {
            self.stats.increment_info(InfoType::QuotaWait);
        }

        let outcome = self.walk_endpoints(key, options).await;
        self.cache.put(cache_key, outcome.clone());
        outcome.into_answers()
    }

    /// Lookup statistics shared by every lookup of this resolver.
    pub fn stats(&self) -> Arc<LookupStats> {
        Arc::clone(&self.stats)
    }

    /// Tries each endpoint in order until one yields a usable answer.
    async fn walk_endpoints(&self, key: &str, options: &QueryOptions) -> CachedAnswer {
        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let query = [
            ("name".to_string(), key.to_string()),
            ("type".to_string(), options.record_type.to_string()),
        ];

        let walk: Vec<&Endpoint> = match &options.endpoint_override {
            Some(endpoint) => vec![endpoint],
            None => self.endpoints.iter().collect(),
        };

        for endpoint in walk {
            let request = TransportRequest {
                endpoint,
                query: &query,
                body: None,
                timeout,
            };
            let response = match self.transport.call(request).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("Err: {e} for {}:{key}", endpoint.url);
                    self.stats.increment_error(ErrorType::TransportError);
                    self.stats.increment_info(InfoType::FailoverAdvance);
                    continue;
                }
            };

            if response.status == HTTP_STATUS_TOO_MANY_REQUESTS {
                let backoff = retry_hint(&response.headers);
                log::warn!(
                    "{} rate-limited the query for {key}, backing off {:?}",
                    endpoint.url,
                    backoff
                );
                self.stats.increment_error(ErrorType::RateLimited);
                self.stats.increment_info(InfoType::FailoverAdvance);
                sleep(backoff).await;
                continue;
            }

            if response.status != HTTP_STATUS_OK {
                log::info!(
                    "Using {}; Response: {}",
                    endpoint.url,
                    response.status
                );
                self.stats.increment_error(ErrorType::UnexpectedStatus);
                self.stats.increment_info(InfoType::FailoverAdvance);
                continue;
            }

            if let Some((remaining, reset_after)) = quota_from_headers(&response.headers) {
                self.quota.observe(remaining, reset_after).await;
            }

            let reply = match wire::parse_reply(&response.body) {
                Ok(reply) => reply,
                Err(e) => {
                    log::warn!("unparseable reply from {} for {key}: {e}", endpoint.url);
                    self.stats.increment_error(ErrorType::MalformedReply);
                    self.stats.increment_info(InfoType::FailoverAdvance);
                    continue;
                }
            };

            if reply.status == DNS_STATUS_NOERROR {
                log::debug!("{} answered {key} ({})", endpoint.url, options.record_type);
                return CachedAnswer::Records(reply.answer_data());
            }

            if self.retry_codes.contains(&reply.status) && options.retry_on_fail {
                log::debug!(
                    "{} returned transient status {} for {key}, trying next endpoint",
                    endpoint.url,
                    reply.status
                );
                self.stats.increment_error(ErrorType::RetryableReply);
                self.stats.increment_info(InfoType::FailoverAdvance);
                continue;
            }

            // Terminal reply status: the server answered authoritatively
            // that there is nothing usable here
            log::debug!(
                "{} returned terminal status {} for {key}",
                endpoint.url,
                reply.status
            );
            return CachedAnswer::Absent;
        }

        self.stats.increment_error(ErrorType::Exhausted);
        CachedAnswer::Absent
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("endpoints", &self.endpoints.len())
            .field("bucket", &self.bucket)
            .field("quota", &self.quota)
            .finish()
    }
}

/// Backoff to apply after a rate-limit response: the reset-window header
/// when present, else the standard retry hint, else one second.
fn retry_hint(headers: &HashMap<String, String>) -> Duration {
    headers
        .get(QUOTA_RESET_HEADER)
        .or_else(|| headers.get(RETRY_AFTER_HEADER))
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(RATE_LIMIT_DEFAULT_BACKOFF)
}
