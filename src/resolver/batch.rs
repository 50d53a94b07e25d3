//! Order-preserving concurrent batch fan-out.

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::config::{QueryOptions, RecordType};

use super::Resolver;

/// One key's outcome in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    /// The key as submitted
    pub key: String,
    /// Answer strings, or `None` when every endpoint was exhausted
    pub answers: Option<Vec<String>>,
}

impl Resolver {
    /// Resolves a batch of keys concurrently.
    ///
    /// All lookups share this resolver's token bucket, quota gate, and
    /// cache. The output has exactly one entry per input key, in input
    /// order, regardless of the order in which the underlying lookups
    /// complete; a key whose endpoints are exhausted yields an absent entry
    /// without affecting its siblings.
    ///
    /// The lookups run as plain futures on the caller's task: dropping the
    /// returned future cancels every in-flight lookup.
    pub async fn resolve_batch(
        &self,
        keys: &[String],
        record_type: RecordType,
    ) -> Vec<LookupResult> {
        self.resolve_batch_with(keys, &QueryOptions::record_type(record_type))
            .await
    }

    /// Resolves a batch of keys concurrently with explicit per-call options.
    pub async fn resolve_batch_with(
        &self,
        keys: &[String],
        options: &QueryOptions,
    ) -> Vec<LookupResult> {
        let mut results: Vec<LookupResult> = keys
            .iter()
            .map(|key| LookupResult {
                key: key.clone(),
                answers: None,
            })
            .collect();

        let mut in_flight: FuturesUnordered<_> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| async move { (index, self.resolve(key, options).await) })
            .collect();

        // Completion order is arbitrary; the index pins each answer to its
        // input slot
        while let Some((index, answers)) = in_flight.next().await {
            results[index].answers = answers;
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::{Endpoint, EndpointList, QuotaSettings, ResolverConfig};
    use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

    use super::super::Resolver;
    use super::*;

    /// Transport that answers per lookup key, with a per-key artificial
    /// delay so completion order differs from input order.
    struct KeyedTransport {
        answers: HashMap<String, &'static str>,
        calls: AtomicUsize,
    }

    impl KeyedTransport {
        fn new(answers: Vec<(&str, &'static str)>) -> Arc<Self> {
            Arc::new(KeyedTransport {
                answers: answers
                    .into_iter()
                    .map(|(key, reply)| (key.to_string(), reply))
                    .collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for KeyedTransport {
        async fn call(
            &self,
            request: TransportRequest<'_>,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = request
                .query
                .iter()
                .find(|(name, _)| name == "name")
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            // Stagger completions so later inputs often finish first
            let jitter = (key.len() % 5) as u64 * 10;
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            match self.answers.get(&key) {
                Some(reply) => Ok(TransportResponse {
                    status: 200,
                    headers: HashMap::new(),
                    body: reply.to_string(),
                }),
                None => Err(TransportError::Failed("no route to host".into())),
            }
        }
    }

    fn resolver_over(transport: Arc<KeyedTransport>) -> Resolver {
        let endpoints =
            EndpointList::new(vec![Endpoint::get("https://doh.example/resolve")]).unwrap();
        let config = ResolverConfig {
            endpoints,
            rate: 1000.0,
            burst: 1000.0,
            quota: QuotaSettings {
                seed_remaining: 1000,
                seed_reset: Duration::from_secs(1),
                ceiling: 1000,
            },
            ..ResolverConfig::default()
        };
        Resolver::new(config, transport).unwrap()
    }

    fn reply(address: &str) -> &'static str {
        // Leak is fine in tests; keeps the scripted map 'static
        Box::leak(
            format!(
                r#"{{"Status": 0, "Answer": [{{"name": "x.", "type": 1, "data": "{address}"}}]}}"#
            )
            .into_boxed_str(),
        )
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order_and_length() {
        let keys: Vec<String> = vec![
            "alpha.example".into(),
            "bb.example".into(),
            "c.example".into(),
            "delta-long.example".into(),
            "ee.example".into(),
        ];
        let transport = KeyedTransport::new(
            keys.iter()
                .enumerate()
                .map(|(i, key)| (key.as_str(), reply(&format!("10.0.0.{i}"))))
                .collect(),
        );
        let resolver = resolver_over(transport);

        let results = resolver.resolve_batch(&keys, RecordType::A).await;

        assert_eq!(results.len(), keys.len());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.key, keys[i], "output order must match input order");
            assert_eq!(result.answers, Some(vec![format!("10.0.0.{i}")]));
        }
    }

    #[tokio::test]
    async fn test_failed_key_does_not_affect_siblings() {
        let keys: Vec<String> = vec![
            "good-one.example".into(),
            "unroutable.example".into(),
            "good-two.example".into(),
        ];
        let transport = KeyedTransport::new(vec![
            ("good-one.example", reply("10.0.0.1")),
            ("good-two.example", reply("10.0.0.2")),
        ]);
        let resolver = resolver_over(transport);

        let results = resolver.resolve_batch(&keys, RecordType::A).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].answers, Some(vec!["10.0.0.1".to_string()]));
        assert_eq!(results[1].answers, None);
        assert_eq!(results[2].answers, Some(vec!["10.0.0.2".to_string()]));
    }

    #[tokio::test]
    async fn test_duplicate_keys_share_the_memo() {
        let keys: Vec<String> = vec!["dup.example".into(); 10];
        let transport = KeyedTransport::new(vec![("dup.example", reply("10.9.9.9"))]);
        let resolver = resolver_over(Arc::clone(&transport));

        // Sequential batches: the second one is answered entirely from cache
        resolver.resolve_batch(&keys, RecordType::A).await;
        let calls_after_first = transport.calls.load(Ordering::SeqCst);
        let results = resolver.resolve_batch(&keys, RecordType::A).await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), calls_after_first);
        assert!(results
            .iter()
            .all(|r| r.answers == Some(vec!["10.9.9.9".to_string()])));
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty() {
        let transport = KeyedTransport::new(vec![]);
        let resolver = resolver_over(transport);
        let results = resolver.resolve_batch(&[], RecordType::A).await;
        assert!(results.is_empty());
    }
}
