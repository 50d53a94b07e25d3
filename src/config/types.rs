//! Configuration types and CLI options.
//!
//! This module defines the record-type enum, the per-call query options, the
//! construction-time resolver configuration, and the CLI argument struct.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use strum_macros::{Display, EnumIter, EnumString};

use crate::config::constants::{
    CACHE_SIZE, DEFAULT_RETRY_CODES, DEFAULT_TIMEOUT_SECS, DOH_BURST, DOH_RATE, IP_BURST,
    IP_CHUNK_SIZE, IP_RATE, QUOTA_CEILING, QUOTA_SEED_REMAINING, QUOTA_SEED_RESET,
};
use crate::config::endpoints::{default_doh_endpoints, default_ip_endpoints, Endpoint, EndpointList};

/// DNS record type a lookup asks for.
///
/// Parsed case-insensitively from strings ("a", "AAAA", "Mx"); an
/// unrecognized string is a configuration error at the call boundary, never
/// a silent passthrough to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Certification authority authorization
    Caa,
    /// Canonical name (alias)
    Cname,
    /// Mail exchange
    Mx,
    /// Authoritative name server
    Ns,
    /// Reverse-lookup pointer
    Ptr,
    /// Start of authority
    Soa,
    /// Service locator
    Srv,
    /// Text record
    Txt,
}

/// Per-call query options.
///
/// The explicit enumeration of everything a single lookup may override:
/// record type, a one-off endpoint, whether transient reply codes advance
/// the endpoint walk, and the transport timeout.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Record type to ask for
    pub record_type: RecordType,
    /// Query this endpoint instead of walking the configured list
    pub endpoint_override: Option<Endpoint>,
    /// Advance to the next endpoint on a transient reply status code
    pub retry_on_fail: bool,
    /// Per-call transport timeout; falls back to the resolver default
    pub timeout: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            record_type: RecordType::A,
            endpoint_override: None,
            retry_on_fail: true,
            timeout: None,
        }
    }
}

impl QueryOptions {
    /// Options for one record type, everything else default.
    pub fn record_type(record_type: RecordType) -> Self {
        QueryOptions {
            record_type,
            ..QueryOptions::default()
        }
    }
}

/// Server-advertised quota settings: the seed used before any response is
/// observed and the ceiling restored when a reset window elapses.
#[derive(Debug, Clone)]
pub struct QuotaSettings {
    /// Remaining-request count before the first response is seen
    pub seed_remaining: u32,
    /// Reset window before the first response is seen
    pub seed_reset: Duration,
    /// Count restored once a full window has elapsed
    pub ceiling: u32,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        QuotaSettings {
            seed_remaining: QUOTA_SEED_REMAINING,
            seed_reset: QUOTA_SEED_RESET,
            ceiling: QUOTA_CEILING,
        }
    }
}

/// Construction-time configuration for the DoH resolver.
///
/// All tunables are explicit here; nothing is read from ambient globals.
/// Validation happens in `Resolver::new`, which rejects non-positive rates,
/// sub-token capacities, and zero cache sizes.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Endpoints walked in failover order
    pub endpoints: EndpointList,
    /// Token refill rate in tokens per second
    pub rate: f64,
    /// Token bucket capacity (burst size)
    pub burst: f64,
    /// Resolution cache capacity in entries
    pub cache_size: usize,
    /// Reply status codes treated as transient
    pub retry_codes: Vec<u16>,
    /// Quota gate seed and ceiling
    pub quota: QuotaSettings,
    /// Default per-call transport timeout
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            endpoints: default_doh_endpoints(),
            rate: DOH_RATE,
            burst: DOH_BURST,
            cache_size: CACHE_SIZE,
            retry_codes: DEFAULT_RETRY_CODES.to_vec(),
            quota: QuotaSettings::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Construction-time configuration for the bulk IP resolver.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Endpoints walked in failover order
    pub endpoints: EndpointList,
    /// Token refill rate in tokens per second
    pub rate: f64,
    /// Token bucket capacity (burst size)
    pub burst: f64,
    /// Maximum keys per chunk query
    pub chunk_size: usize,
    /// Quota gate seed and ceiling
    pub quota: QuotaSettings,
    /// Per-call transport timeout
    pub timeout: Duration,
}

impl Default for GeoConfig {
    fn default() -> Self {
        GeoConfig {
            endpoints: default_ip_endpoints(),
            rate: IP_RATE,
            burst: IP_BURST,
            chunk_size: IP_CHUNK_SIZE,
            quota: QuotaSettings::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Resolution mode the CLI runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// DNS-over-HTTPS with endpoint failover
    Doh,
    /// Plain DNS over UDP
    Dns,
    /// Bulk IP geolocation lookup
    Ip,
}

/// Command-line configuration.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "batch_resolver",
    about = "Resolves batches of domain names or IP addresses through rate-governed remote endpoints."
)]
pub struct Config {
    /// File to read lookup keys from, one per line ("-" for stdin)
    pub file: PathBuf,

    /// Resolution mode
    #[arg(long, value_enum, default_value_t = Mode::Doh)]
    pub mode: Mode,

    /// DNS record type to query (doh and dns modes)
    #[arg(long, default_value = "A")]
    pub record_type: String,

    /// Request rate in tokens per second
    #[arg(long, default_value_t = DOH_RATE)]
    pub rate: f64,

    /// Token bucket capacity (burst size)
    #[arg(long, default_value_t = DOH_BURST)]
    pub burst: f64,

    /// Resolution cache capacity in entries
    #[arg(long, default_value_t = CACHE_SIZE)]
    pub cache_size: usize,

    /// Per-call transport timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Stop at the first endpoint whose reply is a transient failure instead
    /// of trying the next one
    #[arg(long)]
    pub no_retry: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}
