//! Plain DNS resolution over UDP.
//!
//! The classic counterpart to the DoH path: queries go to the system's
//! configured resolvers through hickory instead of walking HTTPS endpoints.
//! Outcomes share the engine's semantics: answers in response order,
//! failures degrade to absent with a warning, and both are memoized in the
//! same bounded cache shape.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use hickory_resolver::proto::rr::RecordType as WireRecordType;
use hickory_resolver::TokioAsyncResolver;

use crate::cache::{CacheKey, CachedAnswer, ResolutionCache};
use crate::config::RecordType;
use crate::error_handling::ConfigError;
use crate::resolver::LookupResult;

/// Plain-DNS resolver with the engine's memo semantics.
pub struct ClassicResolver {
    resolver: Arc<TokioAsyncResolver>,
    cache: ResolutionCache,
}

impl ClassicResolver {
    /// Wraps a configured hickory resolver with a bounded memo.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCacheCapacity` when `cache_size` is zero.
    pub fn new(
        resolver: Arc<TokioAsyncResolver>,
        cache_size: usize,
    ) -> Result<Self, ConfigError> {
        Ok(ClassicResolver {
            resolver,
            cache: ResolutionCache::new(cache_size)?,
        })
    }

    /// Resolves one domain, answering from the memo when possible.
    pub async fn resolve(&self, domain: &str, record_type: RecordType) -> Option<Vec<String>> {
        let cache_key = CacheKey::new(domain, record_type);
        if let Some(cached) = self.cache.get(&cache_key) {
            log::debug!("cache hit for {domain} ({record_type})");
            return cached.into_answers();
        }

        let outcome = match self
            .resolver
            .lookup(domain, wire_record_type(record_type))
            .await
        {
            Ok(lookup) => {
                let records: Vec<String> =
                    lookup.iter().map(|rdata| rdata.to_string()).collect();
                CachedAnswer::Records(records)
            }
            Err(e) => {
                log::warn!("Err: {e} for {domain}");
                CachedAnswer::Absent
            }
        };
        self.cache.put(cache_key, outcome.clone());
        outcome.into_answers()
    }

    /// Resolves a batch of domains concurrently, preserving input order.
    pub async fn resolve_batch(
        &self,
        domains: &[String],
        record_type: RecordType,
    ) -> Vec<LookupResult> {
        let mut results: Vec<LookupResult> = domains
            .iter()
            .map(|domain| LookupResult {
                key: domain.clone(),
                answers: None,
            })
            .collect();

        let mut in_flight: FuturesUnordered<_> = domains
            .iter()
            .enumerate()
            .map(|(index, domain)| async move {
                (index, self.resolve(domain, record_type).await)
            })
            .collect();

        while let Some((index, answers)) = in_flight.next().await {
            results[index].answers = answers;
        }
        results
    }
}

impl std::fmt::Debug for ClassicResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassicResolver")
            .field("cache", &self.cache)
            .finish()
    }
}

/// Maps the engine's record type onto hickory's wire enum.
fn wire_record_type(record_type: RecordType) -> WireRecordType {
    match record_type {
        RecordType::A => WireRecordType::A,
        RecordType::Aaaa => WireRecordType::AAAA,
        RecordType::Caa => WireRecordType::CAA,
        RecordType::Cname => WireRecordType::CNAME,
        RecordType::Mx => WireRecordType::MX,
        RecordType::Ns => WireRecordType::NS,
        RecordType::Ptr => WireRecordType::PTR,
        RecordType::Soa => WireRecordType::SOA,
        RecordType::Srv => WireRecordType::SRV,
        RecordType::Txt => WireRecordType::TXT,
    }
}
