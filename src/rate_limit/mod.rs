//! Request-rate governance.
//!
//! Two independent gates stand in front of every network call:
//! - `TokenBucket` enforces the local request-rate budget (capacity plus
//!   refill rate, lazily computed; no background timer)
//! - `QuotaGate` enforces the server-advertised budget (remaining-request
//!   count and reset window, read back from response headers)
//!
//! A lookup passes both gates before its first byte goes out; a cache hit
//! passes neither.

mod bucket;
mod quota;

pub use bucket::TokenBucket;
pub use quota::{quota_from_headers, QuotaGate};
