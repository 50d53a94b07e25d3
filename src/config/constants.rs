//! Configuration constants.
//!
//! This module defines the default operational parameters used throughout the
//! application: rate budgets, quota seeds, cache and chunk sizes, timeouts,
//! and the header names the quota gate reads from responses.

use std::time::Duration;

// Rate budgets (used as defaults)
/// Default DoH request rate in tokens per second
pub const DOH_RATE: f64 = 20.0;
/// Default DoH bucket capacity (burst size)
pub const DOH_BURST: f64 = 20.0;
/// Default IP batch request rate in tokens per second
/// Deliberately low: the batch endpoint's free tier throttles aggressively
pub const IP_RATE: f64 = 0.75;
/// Default IP batch bucket capacity (burst size)
pub const IP_BURST: f64 = 2.0;
/// Sleep interval between token acquisition attempts
pub const TOKEN_RETRY_INTERVAL: Duration = Duration::from_millis(100);

// Server-advertised quota handling
/// Remaining-request count below which new acquisitions must wait
pub const QUOTA_LOW_WATER: u32 = 2;
/// Remaining-request count the gate is seeded with before any response is seen
pub const QUOTA_SEED_REMAINING: u32 = 15;
/// Reset window the gate is seeded with before any response is seen
pub const QUOTA_SEED_RESET: Duration = Duration::from_secs(60);
/// Ceiling the remaining-request count is restored to once a window elapses
pub const QUOTA_CEILING: u32 = 15;
/// Floor for the per-cycle quota wait
/// Half of a short reset window can round down to nothing; never spin faster than this
pub const QUOTA_MIN_WAIT: Duration = Duration::from_millis(500);
/// Backoff applied on a 429 when the response carries no retry hint
pub const RATE_LIMIT_DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

// Caching and batching
/// Resolution cache capacity in entries
pub const CACHE_SIZE: usize = 128;
/// Maximum keys per bulk IP query
/// The batch endpoint rejects requests with more than 100 entries
pub const IP_CHUNK_SIZE: usize = 99;

// Network operation timeouts
/// Default per-call transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// DNS query timeout in seconds for the plain-DNS path
pub const DNS_TIMEOUT_SECS: u64 = 3;

// Failure classification
/// DNS reply status codes treated as transient server-side conditions.
///
/// A reply carrying one of these advances the endpoint walk instead of
/// terminating the lookup. Callers can override the set per resolver;
/// the classification is a guess, not protocol truth.
pub const DEFAULT_RETRY_CODES: &[u16] = &[2, 5, 8, 9];
/// DNS reply status code meaning the query succeeded
pub const DNS_STATUS_NOERROR: u16 = 0;

// HTTP status codes (for clarity and consistency)
/// Successful HTTP exchange
pub const HTTP_STATUS_OK: u16 = 200;
/// Rate-limit signal
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

// Response header names the core reads, lower-cased to match the transport's
// header map normalization
/// Server-advertised remaining-request count
pub const QUOTA_REMAINING_HEADER: &str = "x-rl";
/// Server-advertised seconds until the quota window resets
pub const QUOTA_RESET_HEADER: &str = "x-ttl";
/// Standard retry hint, used when the quota reset header is absent
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Default User-Agent string for HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("batch_resolver/", env!("CARGO_PKG_VERSION"));
