//! batch_resolver library: concurrent, rate-governed batch name resolution
//!
//! This library resolves batches of lookup keys (domain names or IP
//! addresses) through interchangeable remote endpoints while respecting a
//! local token-bucket budget and the server-advertised quota, failing over
//! across endpoints on transient errors, memoizing outcomes in a bounded
//! LRU cache, and returning answers in input order. One failed key never
//! aborts its batch: it resolves to an absent answer.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use batch_resolver::{
//!     HttpTransport, RecordType, Resolver, ResolverConfig, initialization::init_client,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = init_client(10)?;
//! let transport = Arc::new(HttpTransport::new(client));
//! let resolver = Resolver::new(ResolverConfig::default(), transport)?;
//!
//! let keys: Vec<String> = vec!["example.com".into(), "example.org".into()];
//! for result in resolver.resolve_batch(&keys, RecordType::A).await {
//!     println!("{} -> {:?}", result.key, result.answers);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod cache;
pub mod config;
mod dns;
mod error_handling;
mod geo;
pub mod initialization;
mod rate_limit;
mod resolver;
mod transport;

// Re-export public API
pub use cache::{CacheKey, CachedAnswer, ResolutionCache};
pub use config::{
    Config, Endpoint, EndpointList, GeoConfig, HttpVerb, LogFormat, LogLevel, Mode, QueryOptions,
    QuotaSettings, RecordType, ResolverConfig,
};
pub use dns::ClassicResolver;
pub use error_handling::{ConfigError, ErrorType, InfoType, InitializationError, LookupStats};
pub use geo::IpBatchResolver;
pub use rate_limit::{QuotaGate, TokenBucket};
pub use resolver::{LookupResult, Resolver};
pub use run::{run_batch, BatchReport};
pub use transport::{
    HttpTransport, Transport, TransportError, TransportRequest, TransportResponse,
};

// Internal run module (contains the CLI-facing batch logic)
mod run {
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use log::info;
    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::config::{Config, GeoConfig, Mode, QueryOptions, RecordType, ResolverConfig};
    use crate::dns::ClassicResolver;
    use crate::error_handling::ConfigError;
    use crate::geo::IpBatchResolver;
    use crate::initialization::{init_client, init_resolver};
    use crate::resolver::{LookupResult, Resolver};
    use crate::transport::HttpTransport;

    /// Results of a completed batch run.
    #[derive(Debug, Clone)]
    pub struct BatchReport {
        /// Number of keys submitted
        pub total: usize,
        /// Number of keys that resolved to an answer
        pub resolved: usize,
        /// Number of keys that came back absent
        pub unresolved: usize,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
        /// Per-key outcomes, in input order
        pub results: Vec<LookupResult>,
    }

    /// Runs one batch with the provided configuration.
    ///
    /// Reads lookup keys from the configured file (or stdin when the path
    /// is `-`), skipping blank lines and `#` comments, resolves them in the
    /// selected mode, and returns the ordered outcomes with summary counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or the configuration is
    /// invalid (unknown record type, empty endpoint list, bad rate). Lookup
    /// failures are not errors; they surface as absent results.
    pub async fn run_batch(config: Config) -> Result<BatchReport> {
        let record_type: RecordType = config
            .record_type
            .parse()
            .map_err(|_| ConfigError::InvalidRecordType(config.record_type.clone()))?;

        let keys = read_keys(&config).await?;
        info!("Read {} keys from input", keys.len());

        let start = Instant::now();
        let results = match config.mode {
            Mode::Doh => {
                let client = init_client(config.timeout_seconds)
                    .context("Failed to initialize HTTP client")?;
                let transport = Arc::new(HttpTransport::new(client));
                let resolver = Resolver::new(
                    ResolverConfig {
                        rate: config.rate,
                        burst: config.burst,
                        cache_size: config.cache_size,
                        ..ResolverConfig::default()
                    },
                    transport,
                )?;
                let options = QueryOptions {
                    record_type,
                    retry_on_fail: !config.no_retry,
                    ..QueryOptions::default()
                };
                let results = resolver.resolve_batch_with(&keys, &options).await;
                resolver.stats().log_summary();
                results
            }
            Mode::Dns => {
                let resolver = init_resolver().context("Failed to initialize DNS resolver")?;
                let classic = ClassicResolver::new(resolver, config.cache_size)?;
                classic.resolve_batch(&keys, record_type).await
            }
            Mode::Ip => {
                let client = init_client(config.timeout_seconds)
                    .context("Failed to initialize HTTP client")?;
                let transport = Arc::new(HttpTransport::new(client));
                let resolver = IpBatchResolver::new(GeoConfig::default(), transport)?;
                resolver.lookup(&keys).await
            }
        };

        let elapsed_seconds = start.elapsed().as_secs_f64();
        let resolved = results.iter().filter(|r| r.answers.is_some()).count();
        Ok(BatchReport {
            total: results.len(),
            resolved,
            unresolved: results.len() - resolved,
            elapsed_seconds,
            results,
        })
    }

    /// Reads lookup keys from the configured input, one per line.
    async fn read_keys(config: &Config) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if config.file.as_os_str() == "-" {
            info!("Reading keys from stdin");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                push_key(&mut keys, &line);
            }
        } else {
            let file = tokio::fs::File::open(&config.file)
                .await
                .context("Failed to open input file")?;
            let mut lines = BufReader::new(file).lines();
            while let Some(line) = lines.next_line().await? {
                push_key(&mut keys, &line);
            }
        }
        Ok(keys)
    }

    fn push_key(keys: &mut Vec<String>, line: &str) {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            keys.push(trimmed.to_string());
        }
    }

}
