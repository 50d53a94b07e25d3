//! Application configuration.
//!
//! This module provides:
//! - Configuration constants (rates, quota seeds, timeouts, header names)
//! - Endpoint definitions and the default endpoint lists
//! - Per-call query options and CLI option types
//!
//! Everything a resolver can be tuned with is passed in explicitly at
//! construction; there is no ambient mutable configuration.

mod constants;
mod endpoints;
mod types;

// Re-export all constants
pub use constants::*;
pub use endpoints::{default_doh_endpoints, default_ip_endpoints, Endpoint, EndpointList, HttpVerb};
pub use types::{
    Config, GeoConfig, LogFormat, LogLevel, Mode, QueryOptions, QuotaSettings, RecordType,
    ResolverConfig,
};
