//! Per-entity-type scan: retrieve, deduplicate, score.

use tokio::time::Instant;

use crate::config::{EntityTypeSpec, ScoreCombination, StageLimits};
use crate::error::SearchError;
use crate::matcher::QueryMatcher;
use crate::store::RecordStore;
use crate::types::{Candidate, EntityKind, ScoredResult, SearchableField};

use super::dedup::deduplicate;
use super::retrieve::retrieve;
use super::scoring::score_fields;

/// Scored results for one entity type.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The entity type scanned.
    pub kind: EntityKind,
    /// One result per unique candidate, in deduplicated order.
    pub results: Vec<ScoredResult>,
    /// Stage failures; results are partial when this is non-empty.
    pub errors: Vec<SearchError>,
}

/// Scan one entity type for `matcher`'s query.
///
/// Stage lookups still running at `deadline` are abandoned; whatever the
/// other stages returned is scored as usual.
pub async fn scan<S: RecordStore>(
    store: &S,
    spec: &EntityTypeSpec,
    matcher: &QueryMatcher,
    limits: StageLimits,
    combination: ScoreCombination,
    deadline: Instant,
) -> ScanOutcome {
    let staged = retrieve(store, spec, matcher.query(), limits, deadline).await;
    let row_count = staged.row_count();
    let candidates = deduplicate(staged.stages);

    tracing::debug!(
        entity = %spec.kind,
        rows = row_count,
        unique = candidates.len(),
        "deduplicated staged candidates"
    );

    let results = candidates
        .into_iter()
        .map(|candidate| score_candidate(spec, candidate, matcher, combination))
        .collect();

    ScanOutcome {
        kind: spec.kind,
        results,
        errors: staged.errors,
    }
}

/// The searchable fields of `candidate` as configured by `spec`.
pub fn searchable_fields(spec: &EntityTypeSpec, candidate: &Candidate) -> Vec<SearchableField> {
    spec.fields
        .iter()
        .map(|field| SearchableField {
            name: field.name.clone(),
            weight: field.weight,
            value: candidate.field(&field.name).map(str::to_string),
        })
        .collect()
}

/// Score one candidate and resolve its display title and subtitle.
pub fn score_candidate(
    spec: &EntityTypeSpec,
    candidate: Candidate,
    matcher: &QueryMatcher,
    combination: ScoreCombination,
) -> ScoredResult {
    let score = score_fields(&searchable_fields(spec, &candidate), matcher, combination);
    let title = candidate
        .field(&spec.title_field)
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| spec.fallback_title());
    let subtitle = spec
        .subtitle_field
        .as_deref()
        .and_then(|name| candidate.field(name))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    ScoredResult {
        candidate,
        score,
        title,
        subtitle,
        type_priority: spec.type_priority,
    }
}
