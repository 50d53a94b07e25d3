//! Error type definitions.
//!
//! Configuration and initialization failures are typed errors surfaced to
//! the caller. Per-lookup failures are deliberately not errors: they degrade
//! to absent results and are tallied in `LookupStats` instead.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Configuration errors, fatal at construction time.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A resolver needs at least one endpoint to walk.
    #[error("endpoint list must not be empty")]
    EmptyEndpointList,

    /// The record type string is not a recognized DNS record type.
    #[error("invalid record type: {0:?}")]
    InvalidRecordType(String),

    /// Token refill rate must be positive.
    #[error("refill rate must be positive, got {0}")]
    InvalidRate(f64),

    /// A bucket that can never hold a whole token can never grant one.
    #[error("bucket capacity must be at least one token, got {0}")]
    InvalidCapacity(f64),

    /// The resolution cache cannot be zero-sized.
    #[error("cache capacity must be nonzero")]
    ZeroCacheCapacity,

    /// A quota ceiling below the low-water mark would deadlock the gate.
    #[error("quota ceiling {ceiling} is below the low-water mark {low_water}")]
    QuotaCeilingTooLow {
        /// Configured replenish ceiling
        ceiling: u32,
        /// Gate low-water mark
        low_water: u32,
    },

    /// Bulk queries need a nonzero chunk size.
    #[error("chunk size must be nonzero")]
    ZeroChunkSize,
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error initializing the plain-DNS resolver.
    #[error("DNS resolver initialization error: {0}")]
    DnsResolverError(String),
}

/// Failure conditions observed while walking endpoints for a lookup.
///
/// These categorize why an endpoint was skipped or a lookup came back
/// absent. None of them abort a batch; they exist for the end-of-run
/// statistics and for debugging noisy endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Network-level failure talking to one endpoint
    TransportError,
    /// Endpoint answered 429 or an equivalent rate-limit signal
    RateLimited,
    /// Endpoint answered with a non-200, non-429 HTTP status
    UnexpectedStatus,
    /// Endpoint answered 200 but the body did not parse
    MalformedReply,
    /// Reply carried a status code from the transient set
    RetryableReply,
    /// Every endpoint was tried and none yielded a usable answer
    Exhausted,
}

/// Notable non-failure events observed during lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// Lookup was answered from the cache without touching the gates
    CacheHit,
    /// Lookup moved past a failed endpoint to the next one
    FailoverAdvance,
    /// Lookup waited on the server-advertised quota window
    QuotaWait,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Returns a human-readable string representation of the error type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::TransportError => "Transport error",
            ErrorType::RateLimited => "Rate limited (429)",
            ErrorType::UnexpectedStatus => "Unexpected HTTP status",
            ErrorType::MalformedReply => "Malformed reply body",
            ErrorType::RetryableReply => "Transient reply status",
            ErrorType::Exhausted => "All endpoints exhausted",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::CacheHit => "Cache hit",
            InfoType::FailoverAdvance => "Failover advance",
            InfoType::QuotaWait => "Quota wait",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(ErrorType::TransportError.as_str(), "Transport error");
        assert_eq!(ErrorType::Exhausted.as_str(), "All endpoints exhausted");
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_all_info_types_have_string_representation() {
        for info_type in InfoType::iter() {
            assert!(
                !info_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                info_type
            );
        }
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::QuotaCeilingTooLow {
            ceiling: 1,
            low_water: 2,
        };
        assert_eq!(
            err.to_string(),
            "quota ceiling 1 is below the low-water mark 2"
        );
        assert_eq!(
            ConfigError::InvalidRecordType("A6".into()).to_string(),
            "invalid record type: \"A6\""
        );
    }
}
