//! Case-insensitive containment predicates for one query.
//!
//! A [`QueryMatcher`] is built once per search and evaluated against every
//! candidate field. Word-boundary checks go through the `regex` crate with
//! the query escaped first, so user input such as `c++ (retail)` is always
//! matched literally.

use regex::Regex;

/// Which containment predicates a field value satisfies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchProfile {
    /// Value equals the query.
    pub exact: bool,
    /// Value starts with the query and a word boundary follows it.
    pub prefix_at_boundary: bool,
    /// Value starts with the query.
    pub prefix: bool,
    /// Query occurs with a word boundary on both sides.
    pub whole_word: bool,
    /// Query occurs anywhere.
    pub substring: bool,
}

impl MatchProfile {
    /// Returns `true` if any predicate holds.
    pub fn any(&self) -> bool {
        self.exact || self.prefix || self.substring
    }
}

/// Compiled predicates for one normalised query.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query: String,
    prefix_boundary: Option<Regex>,
    whole_word: Option<Regex>,
}

impl QueryMatcher {
    /// Builds a matcher for `query`, lower-cased and trimmed.
    pub fn new(query: &str) -> Self {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Self {
                query,
                prefix_boundary: None,
                whole_word: None,
            };
        }

        let escaped = regex::escape(&query);
        Self {
            prefix_boundary: compile(&format!(r"^{escaped}\b")),
            whole_word: compile(&format!(r"\b{escaped}\b")),
            query,
        }
    }

    /// The normalised query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Evaluates every predicate against `value`, case-insensitively and
    /// ignoring surrounding whitespace.
    pub fn profile(&self, value: &str) -> MatchProfile {
        if self.query.is_empty() {
            return MatchProfile::default();
        }

        let value = value.trim().to_lowercase();
        let prefix = value.starts_with(&self.query);
        let substring = prefix || value.contains(&self.query);

        MatchProfile {
            exact: value == self.query,
            prefix_at_boundary: prefix && is_match(self.prefix_boundary.as_ref(), &value),
            prefix,
            whole_word: substring && is_match(self.whole_word.as_ref(), &value),
            substring,
        }
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            // Escaped input only fails on the compiled-size limit.
            tracing::debug!(error = %err, "word-boundary pattern rejected; boundary rules disabled");
            None
        }
    }
}

fn is_match(re: Option<&Regex>, value: &str) -> bool {
    re.is_some_and(|re| re.is_match(value))
}
