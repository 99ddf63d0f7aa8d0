//! Staged retrieval: exact, prefix, then fuzzy lookups for one entity type.
//!
//! The exact and prefix stages only look at title fields, which is where
//! the common case (a user typing a record's name) resolves cheaply. The
//! fuzzy stage ORs a substring match across every searchable field and is
//! the most tightly capped. All three run concurrently under the search
//! deadline; a failing or late stage is reported without affecting the
//! other two.

use tokio::time::{timeout_at, Instant};

use crate::config::{EntityTypeSpec, StageLimits};
use crate::error::SearchError;
use crate::store::{RecordStore, TextQuery};
use crate::types::{Candidate, MatchStage};

/// Raw candidates from the three stages of one entity type.
#[derive(Debug, Default)]
pub struct StagedCandidates {
    /// Candidates per stage in precedence order: exact, prefix, fuzzy.
    /// A failed stage contributes an empty set.
    pub stages: Vec<Vec<Candidate>>,
    /// One error per failed stage, in stage order.
    pub errors: Vec<SearchError>,
}

impl StagedCandidates {
    /// Total rows across stages, before deduplication.
    pub fn row_count(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }
}

/// Build the typed lookup for one stage.
pub fn stage_query(
    spec: &EntityTypeSpec,
    stage: MatchStage,
    query: &str,
    limits: StageLimits,
) -> TextQuery {
    let (fields, limit) = match stage {
        MatchStage::Exact => (spec.title_field_names(), limits.exact),
        MatchStage::Prefix => (spec.title_field_names(), limits.prefix),
        MatchStage::Fuzzy => (spec.field_names(), limits.fuzzy),
    };
    TextQuery::new(spec.kind, stage.match_kind(), query)
        .fields(fields)
        .limit(limit)
}

/// Run the three stages concurrently against `store`.
///
/// Each lookup is bounded by `deadline`; a stage still running when it
/// passes is reported as a [`SearchError::Timeout`] while the stages that
/// already returned keep their rows.
pub async fn retrieve<S: RecordStore>(
    store: &S,
    spec: &EntityTypeSpec,
    query: &str,
    limits: StageLimits,
    deadline: Instant,
) -> StagedCandidates {
    let exact = stage_query(spec, MatchStage::Exact, query, limits);
    let prefix = stage_query(spec, MatchStage::Prefix, query, limits);
    let fuzzy = stage_query(spec, MatchStage::Fuzzy, query, limits);

    let (exact_rows, prefix_rows, fuzzy_rows) = futures::join!(
        timeout_at(deadline, store.text_search(&exact)),
        timeout_at(deadline, store.text_search(&prefix)),
        timeout_at(deadline, store.text_search(&fuzzy)),
    );

    let mut staged = StagedCandidates::default();
    for (stage, outcome) in MatchStage::all()
        .into_iter()
        .zip([exact_rows, prefix_rows, fuzzy_rows])
    {
        let failure = match outcome {
            Ok(Ok(rows)) => {
                tracing::debug!(entity = %spec.kind, %stage, count = rows.len(), "stage returned rows");
                staged.stages.push(
                    rows.into_iter()
                        .map(|row| row.into_candidate(spec.kind, stage))
                        .collect(),
                );
                continue;
            }
            Ok(Err(err)) => {
                tracing::warn!(entity = %spec.kind, %stage, error = %err, "stage lookup failed");
                SearchError::Retrieval {
                    entity: spec.kind,
                    stage,
                    message: err.to_string(),
                }
            }
            Err(_elapsed) => {
                tracing::warn!(entity = %spec.kind, %stage, "stage lookup passed the search deadline");
                SearchError::Timeout(format!("{} {stage} stage passed the deadline", spec.kind))
            }
        };
        staged.stages.push(Vec::new());
        staged.errors.push(failure);
    }
    staged
}
