//! Entity catalog and per-search options.
//!
//! [`EntityCatalog`] is the static, process-wide description of which record
//! types exist, which of their fields are searchable, and how they rank
//! against each other on ties. [`SearchOptions`] controls a single search.
//! Both ship with defaults tuned for the CRM's six record types.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::{EntityKind, FieldWeight};

/// Row caps for the three retrieval stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLimits {
    /// Cap on exact-match rows.
    pub exact: usize,
    /// Cap on prefix-match rows.
    pub prefix: usize,
    /// Cap on substring-match rows. The broadest, so the tightest relative cap.
    pub fuzzy: usize,
}

impl Default for StageLimits {
    fn default() -> Self {
        Self {
            exact: 5,
            prefix: 20,
            fuzzy: 50,
        }
    }
}

impl StageLimits {
    fn validate(&self, owner: &str) -> Result<(), SearchError> {
        if self.exact == 0 || self.prefix == 0 || self.fuzzy == 0 {
            return Err(SearchError::Config(format!(
                "{owner}: stage limits must be greater than 0"
            )));
        }
        Ok(())
    }
}

/// A searchable field template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name in the backing store.
    pub name: String,
    /// Title or secondary weighting.
    pub weight: FieldWeight,
}

impl FieldSpec {
    /// A title-weighted field.
    pub fn title(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: FieldWeight::Title,
        }
    }

    /// A secondary field.
    pub fn secondary(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: FieldWeight::Secondary,
        }
    }
}

/// Static search configuration for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeSpec {
    /// The entity type described.
    pub kind: EntityKind,
    /// Fields searched by the fuzzy stage and scored.
    pub fields: Vec<FieldSpec>,
    /// Field shown as the result title. Must be a title-weighted field.
    pub title_field: String,
    /// Field shown as the result subtitle.
    #[serde(default)]
    pub subtitle_field: Option<String>,
    /// Title used when a record has no title value.
    #[serde(default)]
    pub fallback_title: Option<String>,
    /// Per-stage row caps.
    #[serde(default)]
    pub stage_limits: StageLimits,
    /// Tie-break priority; lower sorts first.
    pub type_priority: u32,
}

impl EntityTypeSpec {
    /// Builds a spec with default stage limits and priority.
    pub fn new(kind: EntityKind, fields: Vec<FieldSpec>, title_field: &str) -> Self {
        Self {
            kind,
            fields,
            title_field: title_field.to_string(),
            subtitle_field: None,
            fallback_title: None,
            stage_limits: StageLimits::default(),
            type_priority: kind.default_priority(),
        }
    }

    /// Sets the subtitle field.
    pub fn with_subtitle(mut self, field: &str) -> Self {
        self.subtitle_field = Some(field.to_string());
        self
    }

    /// Names of the title-weighted fields, used by the exact and prefix stages.
    pub fn title_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.weight == FieldWeight::Title)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Names of all searchable fields, used by the fuzzy stage.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Title for records with no usable title value, e.g. "Unnamed Property".
    pub fn fallback_title(&self) -> String {
        self.fallback_title
            .clone()
            .unwrap_or_else(|| format!("Unnamed {}", self.kind.label()))
    }

    /// Validates field configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.fields.is_empty() {
            return Err(SearchError::Config(format!(
                "{}: at least one searchable field is required",
                self.kind
            )));
        }
        let title_ok = self
            .fields
            .iter()
            .any(|f| f.name == self.title_field && f.weight == FieldWeight::Title);
        if !title_ok {
            return Err(SearchError::Config(format!(
                "{}: title_field `{}` must be a title-weighted searchable field",
                self.kind, self.title_field
            )));
        }
        self.stage_limits.validate(self.kind.name())
    }
}

/// The set of searchable entity types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCatalog {
    /// One spec per entity type.
    #[serde(rename = "entity", default)]
    pub specs: Vec<EntityTypeSpec>,
}

impl Default for EntityCatalog {
    fn default() -> Self {
        Self {
            specs: vec![
                EntityTypeSpec::new(
                    EntityKind::Contact,
                    vec![
                        FieldSpec::title("full_name"),
                        FieldSpec::secondary("company"),
                        FieldSpec::secondary("email"),
                    ],
                    "full_name",
                )
                .with_subtitle("company"),
                EntityTypeSpec::new(
                    EntityKind::Deal,
                    vec![
                        FieldSpec::title("deal_name"),
                        FieldSpec::secondary("client_name"),
                    ],
                    "deal_name",
                )
                .with_subtitle("client_name"),
                EntityTypeSpec::new(
                    EntityKind::Property,
                    vec![
                        FieldSpec::title("property_name"),
                        FieldSpec::secondary("address"),
                        FieldSpec::secondary("city"),
                    ],
                    "property_name",
                )
                .with_subtitle("address"),
                EntityTypeSpec::new(
                    EntityKind::Client,
                    vec![FieldSpec::title("client_name")],
                    "client_name",
                )
                .with_subtitle("city"),
                EntityTypeSpec::new(
                    EntityKind::Assignment,
                    vec![
                        FieldSpec::title("assignment_name"),
                        FieldSpec::secondary("client_name"),
                    ],
                    "assignment_name",
                )
                .with_subtitle("client_name"),
                EntityTypeSpec::new(
                    EntityKind::SiteSubmit,
                    vec![
                        FieldSpec::title("site_submit_name"),
                        FieldSpec::secondary("client_name"),
                    ],
                    "site_submit_name",
                )
                .with_subtitle("client_name"),
            ],
        }
    }
}

impl EntityCatalog {
    /// Builds a catalog from explicit specs.
    pub fn new(specs: Vec<EntityTypeSpec>) -> Self {
        Self { specs }
    }

    /// Parses a catalog from TOML (`[[entity]]` tables) and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the TOML is malformed or invalid.
    pub fn from_toml_str(content: &str) -> Result<Self, SearchError> {
        let catalog: Self =
            toml::from_str(content).map_err(|e| SearchError::Config(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Looks up the spec for an entity type.
    pub fn get(&self, kind: EntityKind) -> Option<&EntityTypeSpec> {
        self.specs.iter().find(|s| s.kind == kind)
    }

    /// Validates every spec and rejects duplicate entity types.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.specs.is_empty() {
            return Err(SearchError::Config(
                "catalog must define at least one entity type".into(),
            ));
        }
        let mut seen = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            if seen.contains(&spec.kind) {
                return Err(SearchError::Config(format!(
                    "duplicate entity type in catalog: {}",
                    spec.kind
                )));
            }
            seen.push(spec.kind);
            spec.validate()?;
        }
        Ok(())
    }
}

/// How matching rules combine into one field score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCombination {
    /// Every matching rule adds its points.
    #[default]
    Additive,
    /// Only the highest-scoring matching rule counts.
    BestRule,
}

/// Options for a single search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Entity types to search. Scanned concurrently; results are merged.
    pub enabled_types: Vec<EntityKind>,
    /// Maximum number of results after global ranking.
    pub overall_limit: usize,
    /// Stage limits replacing the catalog's limits for specific types.
    pub stage_limit_overrides: HashMap<EntityKind, StageLimits>,
    /// Deadline covering scanning and aggregation.
    pub timeout: Duration,
    /// Rule combination used by the scorer.
    pub scoring: ScoreCombination,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            enabled_types: EntityKind::all().to_vec(),
            overall_limit: 50,
            stage_limit_overrides: HashMap::new(),
            timeout: Duration::from_secs(3),
            scoring: ScoreCombination::Additive,
        }
    }
}

impl SearchOptions {
    /// Restricts the search to the named entity types.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an unknown type name.
    pub fn with_type_names<I, S>(mut self, names: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.enabled_types = names
            .into_iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<EntityKind>, _>>()?;
        Ok(self)
    }

    /// Stage limits for `spec`, honouring any override.
    pub fn stage_limits_for(&self, spec: &EntityTypeSpec) -> StageLimits {
        self.stage_limit_overrides
            .get(&spec.kind)
            .copied()
            .unwrap_or(spec.stage_limits)
    }

    /// Validates these options, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `overall_limit` must be greater than 0
    /// - `timeout` must be non-zero
    /// - `enabled_types` must not be empty
    /// - stage limit overrides must be non-zero
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.overall_limit == 0 {
            return Err(SearchError::Config(
                "overall_limit must be greater than 0".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SearchError::Config("timeout must be greater than 0".into()));
        }
        if self.enabled_types.is_empty() {
            return Err(SearchError::Config(
                "at least one entity type must be enabled".into(),
            ));
        }
        for (kind, limits) in &self.stage_limit_overrides {
            limits.validate(kind.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_have_sensible_values() {
        let options = SearchOptions::default();
        assert_eq!(options.overall_limit, 50);
        assert_eq!(options.timeout, Duration::from_secs(3));
        assert_eq!(options.enabled_types.len(), 6);
        assert_eq!(options.scoring, ScoreCombination::Additive);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn default_stage_limits() {
        let limits = StageLimits::default();
        assert_eq!((limits.exact, limits.prefix, limits.fuzzy), (5, 20, 50));
    }

    #[test]
    fn zero_overall_limit_rejected() {
        let options = SearchOptions {
            overall_limit: 0,
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("overall_limit"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let options = SearchOptions {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn empty_enabled_types_rejected() {
        let options = SearchOptions {
            enabled_types: vec![],
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("entity type"));
    }

    #[test]
    fn zero_override_rejected() {
        let mut options = SearchOptions::default();
        options.stage_limit_overrides.insert(
            EntityKind::Deal,
            StageLimits {
                exact: 0,
                ..Default::default()
            },
        );
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("deal"));
    }

    #[test]
    fn override_replaces_catalog_limits() {
        let catalog = EntityCatalog::default();
        let spec = catalog.get(EntityKind::Property).expect("property spec");
        let mut options = SearchOptions::default();
        assert_eq!(options.stage_limits_for(spec), StageLimits::default());

        let custom = StageLimits {
            exact: 1,
            prefix: 2,
            fuzzy: 3,
        };
        options
            .stage_limit_overrides
            .insert(EntityKind::Property, custom);
        assert_eq!(options.stage_limits_for(spec), custom);
    }

    #[test]
    fn type_names_parse_into_enabled_types() {
        let options = SearchOptions::default()
            .with_type_names(["property", "site_submit"])
            .expect("known names");
        assert_eq!(
            options.enabled_types,
            vec![EntityKind::Property, EntityKind::SiteSubmit]
        );
        assert!(SearchOptions::default()
            .with_type_names(["tenant"])
            .is_err());
    }

    #[test]
    fn default_catalog_is_valid_and_complete() {
        let catalog = EntityCatalog::default();
        assert!(catalog.validate().is_ok());
        for kind in EntityKind::all() {
            let spec = catalog.get(*kind).expect("spec for every kind");
            assert_eq!(spec.type_priority, kind.default_priority());
        }
    }

    #[test]
    fn fallback_title_uses_label() {
        let catalog = EntityCatalog::default();
        let spec = catalog.get(EntityKind::Property).expect("property spec");
        assert_eq!(spec.fallback_title(), "Unnamed Property");
    }

    #[test]
    fn title_field_must_be_title_weighted() {
        let spec = EntityTypeSpec::new(
            EntityKind::Deal,
            vec![FieldSpec::secondary("deal_name")],
            "deal_name",
        );
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("title_field"));
    }

    #[test]
    fn spec_without_fields_rejected() {
        let spec = EntityTypeSpec::new(EntityKind::Client, vec![], "client_name");
        assert!(spec.validate().is_err());
    }

    #[test]
    fn duplicate_kinds_rejected() {
        let spec = EntityTypeSpec::new(
            EntityKind::Client,
            vec![FieldSpec::title("client_name")],
            "client_name",
        );
        let catalog = EntityCatalog::new(vec![spec.clone(), spec]);
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn catalog_parses_from_toml() {
        let toml = r#"
            [[entity]]
            kind = "property"
            title_field = "property_name"
            subtitle_field = "city"
            type_priority = 1
            fields = [
                { name = "property_name", weight = "title" },
                { name = "city", weight = "secondary" },
            ]
            stage_limits = { exact = 2, prefix = 4 }

            [[entity]]
            kind = "site_submit"
            title_field = "site_submit_name"
            type_priority = 2
            fields = [{ name = "site_submit_name", weight = "title" }]
        "#;
        let catalog = EntityCatalog::from_toml_str(toml).expect("valid catalog");
        assert_eq!(catalog.specs.len(), 2);
        let property = catalog.get(EntityKind::Property).expect("property");
        assert_eq!(property.stage_limits.exact, 2);
        assert_eq!(property.stage_limits.prefix, 4);
        assert_eq!(property.stage_limits.fuzzy, 50);
        assert_eq!(property.subtitle_field.as_deref(), Some("city"));
        let site = catalog.get(EntityKind::SiteSubmit).expect("site submit");
        assert_eq!(site.fallback_title(), "Unnamed Site Submit");
    }

    #[test]
    fn invalid_toml_reports_config_error() {
        let err = EntityCatalog::from_toml_str("[[entity]]\nkind = 7").unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn catalog_loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "[[entity]]\nkind = \"client\"\ntitle_field = \"client_name\"\ntype_priority = 4\n\
             fields = [{ name = \"client_name\", weight = \"title\" }]\n",
        )
        .expect("write catalog");
        let catalog = EntityCatalog::from_file(&path).expect("load catalog");
        assert!(catalog.get(EntityKind::Client).is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EntityCatalog::from_file(Path::new("/nonexistent/catalog.toml")).unwrap_err();
        assert!(matches!(err, SearchError::Io(_)));
    }
}
