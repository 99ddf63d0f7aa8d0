//! Search orchestrator: staged retrieval, dedup, scoring, ranking.
//!
//! For each enabled entity type the orchestrator runs three bounded
//! lookups (exact, prefix, fuzzy), merges them with stage precedence,
//! scores every unique candidate, then ranks all types together into one
//! capped list.

pub mod aggregate;
pub mod dedup;
pub mod retrieve;
pub mod scan;
pub mod scoring;
pub mod search;
pub mod session;
