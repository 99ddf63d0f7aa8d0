//! # entity-search
//!
//! Staged, cross-entity search and relevance ranking for CRM records.
//!
//! Given a free-text query, the engine searches contacts, deals, properties,
//! clients, assignments and site submits, scores every candidate with a
//! deterministic rule table, and returns one globally ordered list.
//!
//! ## Design
//!
//! - Three bounded lookups per entity type (exact, prefix, fuzzy) instead of
//!   one unranked full scan; all three run concurrently
//! - Candidates found by several stages are kept once, tagged with the
//!   earliest stage
//! - Exact title matches score 1010; no partial match can exceed 165
//! - Total ordering: score, then type priority, then title
//! - Per-type failures and timeouts are isolated and reported; cancellation
//!   discards the whole search
//!
//! The storage backend is abstracted behind [`RecordStore`]; [`MemoryStore`]
//! is an in-memory implementation for tests and small datasets.
//!
//! ## Privacy
//!
//! Query text is logged only at trace level.

pub mod cache;
pub mod config;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod store;
pub mod types;

pub use config::{EntityCatalog, EntityTypeSpec, FieldSpec, ScoreCombination, SearchOptions, StageLimits};
pub use error::{Result, SearchError};
pub use orchestrator::search::{SearchCoordinator, SearchOutcome, SearchPhase};
pub use orchestrator::session::SearchSession;
pub use store::{MemoryStore, RawRow, RecordStore, StoreError, TextQuery};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    Candidate, EntityKind, FieldWeight, MatchKind, MatchStage, RankedResultList, ScoredResult,
    SearchableField,
};

/// Search `store` with the default entity catalog.
///
/// Scans all types enabled in `options` concurrently, merges and ranks the
/// results, and returns up to `options.overall_limit` of them alongside any
/// per-type failures.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `options` is invalid. Failures of
/// individual entity types are reported in [`SearchOutcome::errors`].
///
/// # Examples
///
/// ```
/// # async fn example() -> entity_search::Result<()> {
/// use entity_search::{EntityKind, MemoryStore, SearchOptions};
///
/// let store = MemoryStore::new()
///     .with_record(EntityKind::Property, "p1", [("property_name", "Village Walk")]);
/// let outcome = entity_search::search(&store, "village walk", &SearchOptions::default()).await?;
/// assert_eq!(outcome.results.as_slice()[0].title, "Village Walk");
/// # Ok(())
/// # }
/// ```
pub async fn search<S: RecordStore>(
    store: &S,
    query: &str,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    let coordinator = SearchCoordinator::new(store, EntityCatalog::default())?;
    coordinator
        .search(query, options, &CancellationToken::new())
        .await
}
