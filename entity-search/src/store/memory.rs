//! In-memory [`RecordStore`] for tests, demos and small embedded datasets.
//!
//! Supports failure injection and artificial latency per entity type so
//! error isolation, deadlines and cancellation can be exercised without a
//! real database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::SearchError;
use crate::types::{EntityKind, MatchKind};

use super::{RawRow, RecordStore, StoreError, TextQuery};

/// Which lookups for an entity type should fail.
#[derive(Debug, Clone)]
struct FailurePlan {
    /// `None` fails every stage.
    kind: Option<MatchKind>,
    message: String,
}

/// A record store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<EntityKind, Vec<RawRow>>,
    failures: HashMap<EntityKind, Vec<FailurePlan>>,
    latency: HashMap<EntityKind, Duration>,
    stage_latency: HashMap<(EntityKind, MatchKind), Duration>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads records from JSON shaped as `{"<type_name>": [{"id": .., "<field>": ..}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the JSON does not match that shape.
    pub fn from_json(json: &str) -> Result<Self, SearchError> {
        let records: HashMap<EntityKind, Vec<RawRow>> =
            serde_json::from_str(json).map_err(|e| SearchError::Config(e.to_string()))?;
        Ok(Self {
            records,
            ..Self::default()
        })
    }

    /// Adds a record built from `(field, value)` pairs.
    pub fn with_record<'a, I>(mut self, kind: EntityKind, id: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.insert(kind, RawRow::new(id, fields));
        self
    }

    /// Adds a record.
    pub fn insert(&mut self, kind: EntityKind, row: RawRow) {
        self.records.entry(kind).or_default().push(row);
    }

    /// Makes every lookup against `kind` fail.
    pub fn with_failure(mut self, kind: EntityKind, message: &str) -> Self {
        self.failures.entry(kind).or_default().push(FailurePlan {
            kind: None,
            message: message.to_string(),
        });
        self
    }

    /// Makes only lookups of `match_kind` against `kind` fail.
    pub fn with_stage_failure(mut self, kind: EntityKind, match_kind: MatchKind, message: &str) -> Self {
        self.failures.entry(kind).or_default().push(FailurePlan {
            kind: Some(match_kind),
            message: message.to_string(),
        });
        self
    }

    /// Delays every lookup against `kind`.
    pub fn with_latency(mut self, kind: EntityKind, latency: Duration) -> Self {
        self.latency.insert(kind, latency);
        self
    }

    /// Delays only lookups of `match_kind` against `kind`, overriding
    /// [`Self::with_latency`] for that stage.
    pub fn with_stage_latency(mut self, kind: EntityKind, match_kind: MatchKind, latency: Duration) -> Self {
        self.stage_latency.insert((kind, match_kind), latency);
        self
    }

    /// Number of lookups served so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of stored records of `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.records.get(&kind).map_or(0, Vec::len)
    }

    fn failure_for(&self, query: &TextQuery) -> Option<&FailurePlan> {
        self.failures
            .get(&query.entity)?
            .iter()
            .find(|plan| plan.kind.is_none_or(|k| k == query.kind))
    }

    fn lookup(&self, query: &TextQuery) -> Vec<RawRow> {
        let Some(rows) = self.records.get(&query.entity) else {
            return Vec::new();
        };
        let mut matched: Vec<RawRow> = rows
            .iter()
            .filter(|row| {
                query.fields.iter().any(|field| {
                    row.fields
                        .get(field)
                        .is_some_and(|value| query.matches_value(value))
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched.truncate(query.limit);
        matched
    }
}

impl RecordStore for MemoryStore {
    async fn text_search(&self, query: &TextQuery) -> Result<Vec<RawRow>, StoreError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let latency = self
            .stage_latency
            .get(&(query.entity, query.kind))
            .or_else(|| self.latency.get(&query.entity));
        if let Some(latency) = latency {
            tokio::time::sleep(*latency).await;
        }

        if let Some(plan) = self.failure_for(query) {
            return Err(StoreError(plan.message.clone()));
        }

        Ok(self.lookup(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_record(EntityKind::Property, "p2", [("property_name", "Village Walk")])
            .with_record(
                EntityKind::Property,
                "p1",
                [("property_name", "Walker Plaza"), ("city", "Village Park")],
            )
    }

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryStore>();
    }

    #[tokio::test]
    async fn contains_ors_across_fields_in_id_order() {
        let store = store();
        let query = TextQuery::new(EntityKind::Property, MatchKind::Contains, "village")
            .fields(["property_name", "city"]);
        let rows = store.text_search(&query).await.expect("lookup");
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn limit_truncates_rows() {
        let store = store();
        let query = TextQuery::new(EntityKind::Property, MatchKind::Contains, "walk")
            .fields(["property_name"])
            .limit(1);
        let rows = store.text_search(&query).await.expect("lookup");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn unknown_entity_returns_empty() {
        let store = store();
        let query = TextQuery::new(EntityKind::Deal, MatchKind::Contains, "walk")
            .fields(["deal_name"]);
        assert!(store.text_search(&query).await.expect("lookup").is_empty());
    }

    #[tokio::test]
    async fn stage_failure_only_hits_that_stage() {
        let store = store().with_stage_failure(EntityKind::Property, MatchKind::Prefix, "boom");
        let prefix = TextQuery::new(EntityKind::Property, MatchKind::Prefix, "village")
            .fields(["property_name"]);
        let exact = TextQuery::new(EntityKind::Property, MatchKind::Exact, "village walk")
            .fields(["property_name"]);
        assert_eq!(
            store.text_search(&prefix).await.unwrap_err(),
            StoreError("boom".into())
        );
        assert_eq!(store.text_search(&exact).await.expect("exact").len(), 1);
    }

    #[tokio::test]
    async fn entity_failure_hits_every_stage() {
        let store = store().with_failure(EntityKind::Property, "offline");
        for kind in [MatchKind::Exact, MatchKind::Prefix, MatchKind::Contains] {
            let query =
                TextQuery::new(EntityKind::Property, kind, "village").fields(["property_name"]);
            assert!(store.text_search(&query).await.is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stage_latency_only_delays_that_stage() {
        let store = store().with_stage_latency(
            EntityKind::Property,
            MatchKind::Contains,
            Duration::from_secs(5),
        );
        let start = tokio::time::Instant::now();
        let exact = TextQuery::new(EntityKind::Property, MatchKind::Exact, "village walk")
            .fields(["property_name"]);
        store.text_search(&exact).await.expect("exact");
        assert!(start.elapsed() < Duration::from_secs(1));

        let contains = TextQuery::new(EntityKind::Property, MatchKind::Contains, "village")
            .fields(["property_name"]);
        store.text_search(&contains).await.expect("contains");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn loads_from_json() {
        let store = MemoryStore::from_json(
            r#"{
                "contact": [{"id": "c1", "full_name": "John Smith"}],
                "site_submit": [{"id": "s1", "site_submit_name": "Village Walk - Foxtail"}]
            }"#,
        )
        .expect("valid fixture");
        assert_eq!(store.len(EntityKind::Contact), 1);
        assert_eq!(store.len(EntityKind::SiteSubmit), 1);
        assert_eq!(store.len(EntityKind::Deal), 0);
    }

    #[test]
    fn bad_json_is_config_error() {
        let err = MemoryStore::from_json(r#"{"restaurant": []}"#).unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }
}
