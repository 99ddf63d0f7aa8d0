//! Rule-based relevance scoring over containment predicates.
//!
//! Each field is scored from its [`MatchProfile`]:
//!
//! | Rule | Points |
//! |------|--------|
//! | value equals query | 1000, terminal |
//! | starts with query, then a word boundary | 50 |
//! | starts with query | 40 |
//! | query as a whole word | 40 |
//! | query as a substring | 25 |
//! | field is a title field and matched | +10 |
//!
//! Under [`ScoreCombination::Additive`] every matching rule adds its points;
//! under [`ScoreCombination::BestRule`] only the largest one counts. A record
//! scores as its best field, never the sum of its fields.
//!
//! The highest non-exact field score is 165, so an exact title match (1010)
//! can never be outranked by a partial one.

use crate::config::ScoreCombination;
use crate::matcher::{MatchProfile, QueryMatcher};
use crate::types::{FieldWeight, SearchableField};

/// Points for a field equal to the query.
pub const EXACT_MATCH_POINTS: u32 = 1000;
/// Points for a prefix match followed by a word boundary.
pub const PREFIX_BOUNDARY_POINTS: u32 = 50;
/// Points for any prefix match.
pub const PREFIX_POINTS: u32 = 40;
/// Points for a whole-word occurrence.
pub const WHOLE_WORD_POINTS: u32 = 40;
/// Points for any substring occurrence.
pub const SUBSTRING_POINTS: u32 = 25;
/// Bonus for matches in a title-weighted field.
pub const TITLE_BONUS: u32 = 10;

/// Score one field's match profile.
///
/// Returns 0 when no rule matches; the title bonus only applies to fields
/// that matched.
pub fn score_profile(
    profile: &MatchProfile,
    weight: FieldWeight,
    combination: ScoreCombination,
) -> u32 {
    if !profile.any() {
        return 0;
    }

    let bonus = match weight {
        FieldWeight::Title => TITLE_BONUS,
        FieldWeight::Secondary => 0,
    };

    if profile.exact {
        return EXACT_MATCH_POINTS + bonus;
    }

    let rules = [
        (profile.prefix_at_boundary, PREFIX_BOUNDARY_POINTS),
        (profile.prefix, PREFIX_POINTS),
        (profile.whole_word, WHOLE_WORD_POINTS),
        (profile.substring, SUBSTRING_POINTS),
    ];
    let matched = rules.iter().filter(|(hit, _)| *hit).map(|(_, points)| *points);

    let base: u32 = match combination {
        ScoreCombination::Additive => matched.sum(),
        ScoreCombination::BestRule => matched.max().unwrap_or(0),
    };
    base + bonus
}

/// Score a record as its best-matching field.
pub fn score_fields(
    fields: &[SearchableField],
    matcher: &QueryMatcher,
    combination: ScoreCombination,
) -> u32 {
    fields
        .iter()
        .filter_map(|field| {
            let value = field.value.as_deref()?;
            Some(score_profile(&matcher.profile(value), field.weight, combination))
        })
        .max()
        .unwrap_or(0)
}

/// Score a record against a raw query with additive rules.
pub fn score(fields: &[SearchableField], query: &str) -> u32 {
    score_fields(fields, &QueryMatcher::new(query), ScoreCombination::Additive)
}
