//! Search coordinator: normalise, fan out per entity type, rank.
//!
//! # Phases
//!
//! ```text
//! Idle ─► Normalizing ─► Scanning ─► Aggregating ─► Done
//!              │             │
//!              │ empty query └──────► Cancelled
//!              │ or cache hit
//!              └───────────────────────────────────► Done
//! ```
//!
//! Per-type failures and timeouts are isolated into the outcome's error
//! map. Cancellation discards everything, including types that already
//! finished, so a superseded query never yields stale rankings.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKey, ResultCache};
use crate::config::{EntityCatalog, SearchOptions};
use crate::error::SearchError;
use crate::matcher::QueryMatcher;
use crate::store::RecordStore;
use crate::types::{EntityKind, RankedResultList, ScoredResult};

use super::aggregate::aggregate;
use super::scan::scan;

/// Lifecycle of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Not started.
    Idle,
    /// Trimming and validating the query.
    Normalizing,
    /// Entity scanners in flight.
    Scanning,
    /// Merging and ranking completed scans.
    Aggregating,
    /// Results delivered.
    Done,
    /// Superseded or cancelled while scanning.
    Cancelled,
}

impl SearchPhase {
    /// Whether `next` is a legal successor of this phase.
    pub fn can_advance_to(self, next: SearchPhase) -> bool {
        use SearchPhase::*;
        matches!(
            (self, next),
            (Idle, Normalizing)
                | (Normalizing, Scanning)
                | (Normalizing, Done)
                | (Scanning, Aggregating)
                | (Scanning, Cancelled)
                | (Aggregating, Done)
        )
    }
}

#[derive(Debug)]
struct PhaseTracker {
    phase: SearchPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: SearchPhase::Idle,
        }
    }

    fn advance(&mut self, next: SearchPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal search phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(from = ?self.phase, to = ?next, "search phase");
        self.phase = next;
    }
}

/// Ranked results plus any per-type failures.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// Globally ranked, capped results.
    pub results: RankedResultList,
    /// Failures by entity type; those types contributed partial or no results.
    pub errors: BTreeMap<EntityKind, SearchError>,
    /// Whether the results came from the result cache.
    pub cache_hit: bool,
}

impl SearchOutcome {
    /// An empty outcome with no errors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `false` when some entity types failed or timed out.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Trim a raw query; `None` for empty or whitespace-only input.
pub fn normalize_query(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Runs searches over a record store with a fixed entity catalog.
#[derive(Debug)]
pub struct SearchCoordinator<S> {
    store: S,
    catalog: EntityCatalog,
    cache: Option<ResultCache>,
}

impl<S: RecordStore> SearchCoordinator<S> {
    /// Creates a coordinator after validating `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the catalog is invalid.
    pub fn new(store: S, catalog: EntityCatalog) -> Result<Self, SearchError> {
        catalog.validate()?;
        Ok(Self {
            store,
            catalog,
            cache: None,
        })
    }

    /// Caches complete results for `ttl`. A zero TTL disables caching.
    pub fn with_result_cache(mut self, ttl: Duration) -> Self {
        self.cache = (!ttl.is_zero()).then(|| ResultCache::new(ttl));
        self
    }

    /// The entity catalog in use.
    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The result cache, if enabled.
    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Search every enabled entity type and rank the merged results.
    ///
    /// # Pipeline
    ///
    /// 1. Validate `options`; trim the query (empty → empty outcome)
    /// 2. Serve from the result cache when enabled and fresh
    /// 3. Scan each enabled type concurrently under one shared deadline
    /// 4. Record per-type failures and timeouts without aborting siblings
    /// 5. Rank whatever completed and truncate to `options.overall_limit`
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid options and
    /// [`SearchError::Cancelled`] if `cancel` fires before results are
    /// delivered. Entity-level failures are reported in
    /// [`SearchOutcome::errors`], never as `Err`.
    pub async fn search(
        &self,
        raw_query: &str,
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        options.validate()?;

        let mut phase = PhaseTracker::new();
        phase.advance(SearchPhase::Normalizing);

        let Some(query) = normalize_query(raw_query) else {
            tracing::debug!("empty query; returning no results");
            phase.advance(SearchPhase::Done);
            return Ok(SearchOutcome::empty());
        };
        tracing::trace!(query, "normalised query");

        let cache_key = self.cache.as_ref().map(|_| CacheKey::new(query, options));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(results) = cache.get(key).await {
                tracing::debug!(count = results.len(), "result cache hit");
                phase.advance(SearchPhase::Done);
                return Ok(SearchOutcome {
                    results,
                    errors: BTreeMap::new(),
                    cache_hit: true,
                });
            }
        }

        phase.advance(SearchPhase::Scanning);
        let deadline = Instant::now() + options.timeout;
        let matcher = QueryMatcher::new(query);

        let mut errors: BTreeMap<EntityKind, SearchError> = BTreeMap::new();
        let mut kinds = options.enabled_types.clone();
        kinds.sort();
        kinds.dedup();

        let mut scans = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let Some(spec) = self.catalog.get(kind) else {
                errors.insert(
                    kind,
                    SearchError::Config(format!("entity type {kind} is not in the catalog")),
                );
                continue;
            };
            let limits = options.stage_limits_for(spec);
            scans.push(scan(
                &self.store,
                spec,
                &matcher,
                limits,
                options.scoring,
                deadline,
            ));
        }

        let outcomes = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("search cancelled while scanning");
                phase.advance(SearchPhase::Cancelled);
                return Err(SearchError::Cancelled);
            }
            outcomes = futures::future::join_all(scans) => outcomes,
        };

        if cancel.is_cancelled() {
            phase.advance(SearchPhase::Cancelled);
            return Err(SearchError::Cancelled);
        }

        phase.advance(SearchPhase::Aggregating);
        let mut per_type: Vec<Vec<ScoredResult>> = Vec::with_capacity(outcomes.len());
        for scanned in outcomes {
            tracing::debug!(entity = %scanned.kind, count = scanned.results.len(), "entity scan complete");
            if let Some(first) = scanned.errors.into_iter().next() {
                if matches!(first, SearchError::Timeout(_)) {
                    tracing::warn!(entity = %scanned.kind, timeout = ?options.timeout, "entity scan incomplete at deadline");
                }
                errors.insert(scanned.kind, first);
            }
            per_type.push(scanned.results);
        }

        let results = aggregate(per_type, options.overall_limit);
        tracing::debug!(count = results.len(), failed_types = errors.len(), "search complete");

        if errors.is_empty() {
            if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
                cache.insert(key, results.clone()).await;
            }
        }

        phase.advance(SearchPhase::Done);
        Ok(SearchOutcome {
            results,
            errors,
            cache_hit: false,
        })
    }
}
