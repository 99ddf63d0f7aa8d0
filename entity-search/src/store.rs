//! Trait definition for the backing record store.
//!
//! The engine only needs one primitive from storage: a bounded,
//! case-insensitive text lookup over a set of fields of one entity type.
//! [`TextQuery`] is the typed form of that lookup, so the staged retriever
//! never builds backend-specific filter strings.

pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Candidate, EntityKind, MatchKind, MatchStage};

pub use memory::MemoryStore;

/// A failure reported by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// A bounded text lookup against one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    /// Entity type to search.
    pub entity: EntityKind,
    /// Fields combined with a logical OR.
    pub fields: Vec<String>,
    /// Case-insensitive predicate applied to each field.
    pub kind: MatchKind,
    /// Normalised query text.
    pub text: String,
    /// Maximum rows to return.
    pub limit: usize,
}

impl TextQuery {
    /// Starts a lookup with no fields and no row cap.
    pub fn new(entity: EntityKind, kind: MatchKind, text: &str) -> Self {
        Self {
            entity,
            fields: Vec::new(),
            kind,
            text: text.to_string(),
            limit: usize::MAX,
        }
    }

    /// Sets the fields to match against.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns `true` if `value` satisfies this query's predicate,
    /// comparing case-insensitively and ignoring surrounding whitespace.
    pub fn matches_value(&self, value: &str) -> bool {
        let value = value.trim().to_lowercase();
        let text = self.text.to_lowercase();
        match self.kind {
            MatchKind::Exact => value == text,
            MatchKind::Prefix => value.starts_with(&text),
            MatchKind::Contains => value.contains(&text),
        }
    }
}

/// A row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Record id.
    pub id: String,
    /// Field values by name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl RawRow {
    /// Builds a row from `(field, value)` pairs.
    pub fn new<'a, I>(id: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            id: id.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Tags this row with its entity type and the stage that found it.
    pub fn into_candidate(self, kind: EntityKind, stage: MatchStage) -> Candidate {
        Candidate {
            id: self.id,
            kind,
            fields: self.fields,
            stage_found: stage,
        }
    }
}

/// A read-only source of searchable records.
///
/// Implementations must be `Send + Sync`: one search issues lookups for
/// several entity types and stages concurrently against the same store.
pub trait RecordStore: Send + Sync {
    /// Run a bounded text lookup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup cannot be executed. The engine
    /// isolates the failure to the stage and entity type that issued it.
    fn text_search(
        &self,
        query: &TextQuery,
    ) -> impl std::future::Future<Output = Result<Vec<RawRow>, StoreError>> + Send;
}

impl<T: RecordStore> RecordStore for &T {
    fn text_search(
        &self,
        query: &TextQuery,
    ) -> impl std::future::Future<Output = Result<Vec<RawRow>, StoreError>> + Send {
        (**self).text_search(query)
    }
}

impl<T: RecordStore> RecordStore for std::sync::Arc<T> {
    fn text_search(
        &self,
        query: &TextQuery,
    ) -> impl std::future::Future<Output = Result<Vec<RawRow>, StoreError>> + Send {
        (**self).text_search(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields_and_limit() {
        let query = TextQuery::new(EntityKind::Deal, MatchKind::Prefix, "smith")
            .fields(["deal_name", "client_name"])
            .limit(20);
        assert_eq!(query.fields, vec!["deal_name", "client_name"]);
        assert_eq!(query.limit, 20);
        assert_eq!(query.kind, MatchKind::Prefix);
    }

    #[test]
    fn predicates_are_case_insensitive() {
        let exact = TextQuery::new(EntityKind::Property, MatchKind::Exact, "village walk");
        assert!(exact.matches_value("Village Walk"));
        assert!(!exact.matches_value("Village Walk - Foxtail"));

        let prefix = TextQuery::new(EntityKind::Property, MatchKind::Prefix, "VILLAGE");
        assert!(prefix.matches_value("Village Walk"));
        assert!(!prefix.matches_value("The Village"));

        assert!(exact.matches_value(" Village Walk  "));

        let contains = TextQuery::new(EntityKind::Property, MatchKind::Contains, "walk");
        assert!(contains.matches_value("Village Walk - Foxtail"));
    }

    #[test]
    fn raw_row_becomes_candidate() {
        let row = RawRow::new("c1", [("full_name", "John Smith")]);
        let candidate = row.into_candidate(EntityKind::Contact, MatchStage::Fuzzy);
        assert_eq!(candidate.identity(), (EntityKind::Contact, "c1"));
        assert_eq!(candidate.field("full_name"), Some("John Smith"));
        assert_eq!(candidate.stage_found, MatchStage::Fuzzy);
    }

    #[test]
    fn raw_row_fields_flatten_in_json() {
        let row: RawRow =
            serde_json::from_str(r#"{"id":"d1","deal_name":"Smith Plaza"}"#).expect("parse");
        assert_eq!(row.id, "d1");
        assert_eq!(row.fields.get("deal_name").map(String::as_str), Some("Smith Plaza"));
    }
}
