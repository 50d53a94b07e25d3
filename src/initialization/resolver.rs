//! Plain-DNS resolver initialization.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;

use crate::error_handling::InitializationError;

/// Initializes the hickory resolver for the plain-DNS path.
///
/// Uses the default upstream configuration with aggressive timeouts so a
/// slow or unresponsive DNS server fails a lookup fast instead of stalling
/// the batch.
///
/// # Errors
///
/// Returns `InitializationError::DnsResolverError` if construction fails
/// (rare; the default configuration needs no system state).
pub fn init_resolver() -> Result<Arc<TokioAsyncResolver>, InitializationError> {
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(crate::config::DNS_TIMEOUT_SECS);
    opts.attempts = 2;
    // Lookup keys are absolute names; never append search domains
    opts.ndots = 0;

    Ok(Arc::new(TokioAsyncResolver::tokio(
        ResolverConfig::default(),
        opts,
    )))
}
