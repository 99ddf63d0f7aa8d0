//! Optional short-lived cache of ranked results.
//!
//! Keyed by the normalised query plus everything in [`SearchOptions`] that
//! changes the ranking. Uses [`moka`] so entries expire on their own once
//! the TTL passes; an expired entry is never returned.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use moka::future::Cache;

use crate::config::SearchOptions;
use crate::types::{EntityKind, RankedResultList};

/// Maximum number of cached result lists.
const MAX_CACHE_ENTRIES: u64 = 256;

/// Composite cache key: normalised query + options fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed query string.
    query: String,
    /// Hash of the sorted entity set, limit, scoring mode and stage overrides.
    options_hash: u64,
}

impl CacheKey {
    /// Build a deterministic key. Entity order in `options` does not matter.
    pub fn new(query: &str, options: &SearchOptions) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            options_hash: hash_options(options),
        }
    }
}

/// TTL-bounded cache of complete search results.
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<CacheKey, RankedResultList>,
    ttl: Duration,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl ResultCache {
    /// A cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached results for `key`, if present and not expired.
    pub async fn get(&self, key: &CacheKey) -> Option<RankedResultList> {
        self.inner.get(key).await
    }

    /// Store results for `key`.
    pub async fn insert(&self, key: CacheKey, results: RankedResultList) {
        self.inner.insert(key, results).await;
    }

    /// Drop every entry, e.g. after the underlying records change.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

fn hash_options(options: &SearchOptions) -> u64 {
    let mut kinds: Vec<EntityKind> = options.enabled_types.clone();
    kinds.sort();
    kinds.dedup();

    let mut overrides: Vec<_> = options
        .stage_limit_overrides
        .iter()
        .map(|(kind, limits)| (*kind, limits.exact, limits.prefix, limits.fuzzy))
        .collect();
    overrides.sort();

    let mut hasher = DefaultHasher::new();
    kinds.hash(&mut hasher);
    options.overall_limit.hash(&mut hasher);
    options.scoring.hash(&mut hasher);
    overrides.hash(&mut hasher);
    hasher.finish()
}
