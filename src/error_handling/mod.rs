//! Error handling and lookup statistics.
//!
//! This module provides:
//! - Typed configuration and initialization errors (fatal, surfaced to the
//!   caller at construction time)
//! - Lookup failure/info categorization and counter tracking
//!
//! Per-lookup failures are not represented as `Err` values anywhere in the
//! engine: a lookup that exhausts its endpoints resolves to an absent
//! answer, and the condition is recorded here.

mod stats;
mod types;

// Re-export public API
pub use stats::LookupStats;
pub use types::{ConfigError, ErrorType, InfoType, InitializationError};
