//! Candidate deduplication across the three retrieval stages.
//!
//! A record found by several stages is kept once, tagged with the earliest
//! stage that found it. Precedence is by stage (exact, prefix, fuzzy), not
//! by the order stage results arrived or were passed in.

use std::collections::HashSet;

use crate::types::{Candidate, EntityKind};

/// Merge staged candidate sets into unique candidates.
///
/// Output order is stage precedence first, then the store's row order
/// within each stage. Each `(kind, id)` appears at most once.
pub fn deduplicate<I>(stage_sets: I) -> Vec<Candidate>
where
    I: IntoIterator<Item = Vec<Candidate>>,
{
    let mut all: Vec<Candidate> = stage_sets.into_iter().flatten().collect();
    // Stable: keeps row order inside a stage.
    all.sort_by_key(|c| c.stage_found);

    let mut seen: HashSet<(EntityKind, String)> = HashSet::with_capacity(all.len());
    all.into_iter()
        .filter(|c| seen.insert((c.kind, c.id.clone())))
        .collect()
}
