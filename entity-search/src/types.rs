//! Core types for candidates, scored results and entity identification.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SearchError;

/// CRM record types that can be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// People: brokers, owners, tenant reps.
    Contact,
    /// Transactions in the pipeline.
    Deal,
    /// Physical properties and shopping centers.
    Property,
    /// Client companies.
    Client,
    /// Site-selection assignments for a client.
    Assignment,
    /// A site submitted against an assignment.
    SiteSubmit,
}

impl EntityKind {
    /// Returns the stable type name used in configuration and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Deal => "deal",
            Self::Property => "property",
            Self::Client => "client",
            Self::Assignment => "assignment",
            Self::SiteSubmit => "site_submit",
        }
    }

    /// Returns the human-readable label, used for untitled records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Deal => "Deal",
            Self::Property => "Property",
            Self::Client => "Client",
            Self::Assignment => "Assignment",
            Self::SiteSubmit => "Site Submit",
        }
    }

    /// Returns the default tie-break priority (lower sorts first).
    pub fn default_priority(&self) -> u32 {
        match self {
            Self::Contact => 1,
            Self::Deal => 2,
            Self::Property => 3,
            Self::Client => 4,
            Self::Assignment => 5,
            Self::SiteSubmit => 6,
        }
    }

    /// Returns all entity kinds in default priority order.
    pub fn all() -> &'static [EntityKind] {
        &[
            Self::Contact,
            Self::Deal,
            Self::Property,
            Self::Client,
            Self::Assignment,
            Self::SiteSubmit,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| SearchError::Config(format!("unknown entity type: {s}")))
    }
}

/// Whether a field is the record's primary title or a secondary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldWeight {
    /// Primary display field; earns the title bonus.
    Title,
    /// Any other searchable field.
    Secondary,
}

/// One searchable field value of a record, ready for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchableField {
    /// Field name as stored in the backing store.
    pub name: String,
    /// Title or secondary.
    pub weight: FieldWeight,
    /// Field text; `None` when the record has no value.
    pub value: Option<String>,
}

/// The retrieval stage a candidate was first found in.
///
/// Ordering follows stage precedence: `Exact < Prefix < Fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    /// Field equals the query.
    Exact,
    /// Field starts with the query.
    Prefix,
    /// Field contains the query anywhere.
    Fuzzy,
}

impl MatchStage {
    /// Stages in precedence order.
    pub fn all() -> [MatchStage; 3] {
        [Self::Exact, Self::Prefix, Self::Fuzzy]
    }

    /// The store predicate used to run this stage.
    pub fn match_kind(&self) -> MatchKind {
        match self {
            Self::Exact => MatchKind::Exact,
            Self::Prefix => MatchKind::Prefix,
            Self::Fuzzy => MatchKind::Contains,
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Fuzzy => "fuzzy",
        })
    }
}

/// Case-insensitive text predicate understood by a [`crate::RecordStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Field equals the query text.
    Exact,
    /// Field starts with the query text.
    Prefix,
    /// Field contains the query text.
    Contains,
}

/// A raw record returned by a staged lookup, prior to scoring.
///
/// Identity is `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Record id, unique within its entity kind.
    pub id: String,
    /// Entity kind the record belongs to.
    pub kind: EntityKind,
    /// Field values by field name.
    pub fields: BTreeMap<String, String>,
    /// Earliest stage the record was found in.
    pub stage_found: MatchStage,
}

impl Candidate {
    /// The `(kind, id)` identity used for deduplication.
    pub fn identity(&self) -> (EntityKind, &str) {
        (self.kind, self.id.as_str())
    }

    /// Returns a field value if present and not blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A candidate after relevance scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// The scored record.
    pub candidate: Candidate,
    /// Relevance score; exact title matches score at least 1000.
    pub score: u32,
    /// Display title (falls back to "Unnamed <Kind>").
    pub title: String,
    /// Display subtitle; empty when the record has none.
    pub subtitle: String,
    /// Tie-break priority of the record's entity type.
    pub type_priority: u32,
}

impl ScoredResult {
    /// Entity kind of the underlying record.
    pub fn kind(&self) -> EntityKind {
        self.candidate.kind
    }

    /// Record id of the underlying record.
    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// Globally ordered, capped search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResultList(Vec<ScoredResult>);

impl RankedResultList {
    /// An empty result list.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn from_sorted(results: Vec<ScoredResult>) -> Self {
        Self(results)
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no results.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Results in rank order.
    pub fn as_slice(&self) -> &[ScoredResult] {
        &self.0
    }

    /// Iterate results in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredResult> {
        self.0.iter()
    }

    /// Consume into the ordered vector.
    pub fn into_vec(self) -> Vec<ScoredResult> {
        self.0
    }
}

impl IntoIterator for RankedResultList {
    type Item = ScoredResult;
    type IntoIter = std::vec::IntoIter<ScoredResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedResultList {
    type Item = &'a ScoredResult;
    type IntoIter = std::slice::Iter<'a, ScoredResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
