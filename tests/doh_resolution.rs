//! Integration tests for the DoH resolution engine
//!
//! These tests drive the real HTTP transport against mock DoH endpoints and
//! verify the core orchestration logic:
//! - Endpoint failover order (first usable answer wins)
//! - Exhaustion isolation within a batch
//! - Order preservation regardless of completion order
//! - Cache short-circuiting
//! - 429 backoff handling and quota-header observation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use batch_resolver::initialization::init_client;
use batch_resolver::{
    Endpoint, EndpointList, HttpTransport, QueryOptions, QuotaSettings, RecordType, Resolver,
    ResolverConfig,
};

/// Builds a DNS-JSON success body answering with the given addresses.
fn doh_body(addresses: &[&str]) -> String {
    let answers: Vec<serde_json::Value> = addresses
        .iter()
        .map(|address| {
            serde_json::json!({
                "name": "example.com.",
                "type": 1,
                "TTL": 300,
                "data": address,
            })
        })
        .collect();
    serde_json::json!({"Status": 0, "Answer": answers}).to_string()
}

/// Extracts the `name` query parameter from a mock request.
fn queried_name(request: &Request) -> String {
    request
        .url
        .query_pairs()
        .find(|(name, _)| name == "name")
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

/// Resolver over the given endpoints with gates opened wide so tests are
/// not pacing-limited unless they mean to be.
fn fast_resolver(endpoints: Vec<Endpoint>) -> Resolver {
    let client = init_client(5).expect("client should build");
    let transport = Arc::new(HttpTransport::new(client));
    let config = ResolverConfig {
        endpoints: EndpointList::new(endpoints).expect("endpoints should not be empty"),
        rate: 1000.0,
        burst: 1000.0,
        quota: QuotaSettings {
            seed_remaining: 1000,
            seed_reset: Duration::from_secs(1),
            ceiling: 1000,
        },
        ..ResolverConfig::default()
    };
    Resolver::new(config, transport).expect("resolver should build")
}

#[tokio::test]
async fn test_failover_second_endpoint_wins_and_third_is_never_tried() {
    let mock_server = MockServer::start().await;

    let third_calls = Arc::new(AtomicUsize::new(0));
    let third_calls_clone = Arc::clone(&third_calls);

    // First endpoint: transient SERVFAIL reply
    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Status": 2}"#))
        .mount(&mock_server)
        .await;
    // Second endpoint: usable answer
    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_string(doh_body(&["93.184.216.34"])))
        .mount(&mock_server)
        .await;
    // Third endpoint: must never be reached
    Mock::given(method("GET"))
        .and(path("/three"))
        .respond_with(move |_req: &Request| {
            third_calls_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_string(doh_body(&["203.0.113.99"]))
        })
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![
        Endpoint::get(format!("{}/one", mock_server.uri())),
        Endpoint::get(format!("{}/two", mock_server.uri())),
        Endpoint::get(format!("{}/three", mock_server.uri())),
    ]);

    let answers = resolver
        .resolve("example.com", &QueryOptions::default())
        .await;

    assert_eq!(answers, Some(vec!["93.184.216.34".to_string()]));
    assert_eq!(
        third_calls.load(Ordering::SeqCst),
        0,
        "endpoints after the first success must never be invoked"
    );
}

#[tokio::test]
async fn test_exhausted_key_is_absent_while_siblings_resolve() {
    let mock_server = MockServer::start().await;

    // One endpoint that answers per key: the doomed key always gets a
    // transient failure, everything else resolves
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .respond_with(move |request: &Request| {
            if queried_name(request) == "down.example" {
                ResponseTemplate::new(200).set_body_string(r#"{"Status": 2}"#)
            } else {
                ResponseTemplate::new(200).set_body_string(doh_body(&["10.0.0.1"]))
            }
        })
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![Endpoint::get(format!(
        "{}/dns-query",
        mock_server.uri()
    ))]);

    let keys: Vec<String> = vec![
        "alive-one.example".into(),
        "down.example".into(),
        "alive-two.example".into(),
    ];
    let results = resolver.resolve_batch(&keys, RecordType::A).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].key, "alive-one.example");
    assert_eq!(results[0].answers, Some(vec!["10.0.0.1".to_string()]));
    assert_eq!(results[1].key, "down.example");
    assert_eq!(results[1].answers, None, "exhausted key resolves to absent");
    assert_eq!(results[2].key, "alive-two.example");
    assert_eq!(results[2].answers, Some(vec!["10.0.0.1".to_string()]));
}

#[tokio::test]
async fn test_batch_output_matches_input_order_under_concurrency() {
    let mock_server = MockServer::start().await;

    // Answers derive from the queried name; a key-dependent delay shuffles
    // completion order
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .respond_with(move |request: &Request| {
            let name = queried_name(request);
            let index: usize = name
                .trim_start_matches("host")
                .trim_end_matches(".example")
                .parse()
                .unwrap_or(0);
            let delay = Duration::from_millis(((7 * index) % 40) as u64);
            ResponseTemplate::new(200)
                .set_delay(delay)
                .set_body_string(doh_body(&[&format!("10.0.0.{index}")]))
        })
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![Endpoint::get(format!(
        "{}/dns-query",
        mock_server.uri()
    ))]);

    let keys: Vec<String> = (0..12).map(|i| format!("host{i}.example")).collect();
    let results = resolver.resolve_batch(&keys, RecordType::A).await;

    assert_eq!(results.len(), keys.len());
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.key, keys[i], "output order must match input order");
        assert_eq!(result.answers, Some(vec![format!("10.0.0.{i}")]));
    }
}

#[tokio::test]
async fn test_repeat_resolution_is_served_from_cache() {
    let mock_server = MockServer::start().await;

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = Arc::clone(&calls);
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .respond_with(move |_req: &Request| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_string(doh_body(&["93.184.216.34"]))
        })
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![Endpoint::get(format!(
        "{}/dns-query",
        mock_server.uri()
    ))]);

    let first = resolver
        .resolve("example.com", &QueryOptions::default())
        .await;
    let second = resolver
        .resolve("example.com", &QueryOptions::default())
        .await;

    assert_eq!(first, Some(vec!["93.184.216.34".to_string()]));
    assert_eq!(second, first, "cached answer must be identical");
    assert_eq!(
        calls.load(Ordering::SeqCst),
        1,
        "repeat resolution must issue no further network calls"
    );
}

#[tokio::test]
async fn test_rate_limited_endpoint_backs_off_then_fails_over() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("x-ttl", "1"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_string(doh_body(&["93.184.216.34"])))
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![
        Endpoint::get(format!("{}/limited", mock_server.uri())),
        Endpoint::get(format!("{}/healthy", mock_server.uri())),
    ]);

    let start = Instant::now();
    let answers = resolver
        .resolve("example.com", &QueryOptions::default())
        .await;
    let elapsed = start.elapsed();

    assert_eq!(answers, Some(vec!["93.184.216.34".to_string()]));
    assert!(
        elapsed >= Duration::from_millis(900),
        "the advertised one-second backoff must be honored, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_depleted_quota_headers_throttle_the_next_lookup() {
    let mock_server = MockServer::start().await;

    // Every reply advertises a nearly-exhausted quota with a one-second
    // reset window
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-rl", "1")
                .insert_header("x-ttl", "1")
                .set_body_string(doh_body(&["93.184.216.34"])),
        )
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![Endpoint::get(format!(
        "{}/dns-query",
        mock_server.uri()
    ))]);

    resolver
        .resolve("first.example", &QueryOptions::default())
        .await;

    // The observed remaining count (1) sits below the low-water mark, so
    // the next lookup must wait out the advertised window
    let start = Instant::now();
    let answers = resolver
        .resolve("second.example", &QueryOptions::default())
        .await;
    let elapsed = start.elapsed();

    assert_eq!(answers, Some(vec!["93.184.216.34".to_string()]));
    assert!(
        elapsed >= Duration::from_millis(900),
        "lookup should have waited out the quota window, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_malformed_reply_advances_to_next_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>backend error</html>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_string(doh_body(&["93.184.216.34"])))
        .mount(&mock_server)
        .await;

    let resolver = fast_resolver(vec![
        Endpoint::get(format!("{}/garbled", mock_server.uri())),
        Endpoint::get(format!("{}/healthy", mock_server.uri())),
    ]);

    let answers = resolver
        .resolve("example.com", &QueryOptions::default())
        .await;
    assert_eq!(answers, Some(vec!["93.184.216.34".to_string()]));
}
