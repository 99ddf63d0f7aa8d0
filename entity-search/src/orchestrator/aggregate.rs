//! Global merge and ranking across entity types.
//!
//! Results are ordered by score (descending), then type priority
//! (ascending), then case-insensitive title. Entity type and record id
//! break any remaining tie, so the order is total and the same input
//! always produces the same list.

use std::cmp::{Ordering, Reverse};

use crate::types::{EntityKind, RankedResultList, ScoredResult};

type RankKey = (Reverse<u32>, u32, String, EntityKind, String);

fn rank_key(result: &ScoredResult) -> RankKey {
    (
        Reverse(result.score),
        result.type_priority,
        result.title.to_lowercase(),
        result.kind(),
        result.id().to_string(),
    )
}

/// Compare two results by rank; `Less` means `a` is listed first.
pub fn compare_rank(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    rank_key(a).cmp(&rank_key(b))
}

/// Merge per-type results, rank them and keep the top `overall_limit`.
pub fn aggregate<I>(per_type: I, overall_limit: usize) -> RankedResultList
where
    I: IntoIterator<Item = Vec<ScoredResult>>,
{
    let mut merged: Vec<ScoredResult> = per_type.into_iter().flatten().collect();
    merged.sort_by_cached_key(rank_key);
    merged.truncate(overall_limit);
    RankedResultList::from_sorted(merged)
}
