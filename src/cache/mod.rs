//! Bounded resolution memo with LRU eviction.
//!
//! Every completed lookup, positive or exhausted, lands here keyed by
//! `(key, record type)`, so repeat queries skip the rate gates and the
//! network entirely. Capacity is fixed at construction; the least recently
//! used entry is evicted when it is exceeded.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::config::RecordType;
use crate::error_handling::ConfigError;

/// Identity of a memoized lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
    record_type: RecordType,
}

impl CacheKey {
    /// Builds the identity for one (key, record-type) lookup.
    pub fn new(key: impl Into<String>, record_type: RecordType) -> Self {
        CacheKey {
            key: key.into(),
            record_type,
        }
    }
}

/// A memoized lookup outcome.
///
/// Exhaustion is cached as an explicit negative entry rather than being
/// looked up again: an endpoint set that could not answer a key once is
/// unlikely to answer it moments later, and the batch semantics treat
/// "no answer" as a result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedAnswer {
    /// Answer strings in the order the endpoint returned them
    Records(Vec<String>),
    /// Every endpoint was exhausted without a usable answer
    Absent,
}

impl CachedAnswer {
    /// Converts the cache entry into the caller-facing answer shape.
    pub fn into_answers(self) -> Option<Vec<String>> {
        match self {
            CachedAnswer::Records(records) => Some(records),
            CachedAnswer::Absent => None,
        }
    }
}

/// Bounded (key, record-type) answer memo.
///
/// Access is serialized by a plain mutex; no lock is ever held across a
/// suspension point, so concurrent lookups interleave cleanly. Two lookups
/// racing on the same key may each pay one network round trip; the second
/// write simply overwrites the first.
pub struct ResolutionCache {
    entries: Mutex<LruCache<CacheKey, CachedAnswer>>,
}

impl ResolutionCache {
    /// Creates a cache with the given entry capacity.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCacheCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCacheCapacity)?;
        Ok(ResolutionCache {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Returns the memoized outcome for a key, marking it recently used.
    pub fn get(&self, key: &CacheKey) -> Option<CachedAnswer> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(key).cloned()
    }

    /// Inserts or updates an outcome, evicting the least recently used
    /// entry when the cache is full.
    pub fn put(&self, key: CacheKey, value: CachedAnswer) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.put(key, value);
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("len", &self.len())
            .finish()
    }
}
