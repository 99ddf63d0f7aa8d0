//! Error types for the entity-search crate.
//!
//! Per-entity-type failures never abort a search: they are collected into
//! the outcome's error map alongside whatever results completed. Only
//! configuration problems and cancellation surface as the `Err` side of
//! [`crate::SearchCoordinator::search`].

use crate::types::{EntityKind, MatchStage};

/// Errors that can occur while searching across entity types.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A staged lookup (or a whole entity type) failed in the backing store.
    #[error("retrieval error for {entity} ({stage} stage): {message}")]
    Retrieval {
        /// Entity type whose lookup failed.
        entity: EntityKind,
        /// Which of the three stages failed.
        stage: MatchStage,
        /// Store-provided failure description.
        message: String,
    },

    /// The search deadline expired before this entity type finished.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// The search was superseded or cancelled by the caller.
    #[error("search cancelled")]
    Cancelled,

    /// Invalid search options or entity catalog.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while loading a catalog file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    /// Returns `true` for errors that only affect part of a search.
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Retrieval { .. } | Self::Timeout(_))
    }
}

/// Convenience type alias for entity-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_retrieval() {
        let err = SearchError::Retrieval {
            entity: EntityKind::Deal,
            stage: MatchStage::Prefix,
            message: "connection reset".into(),
        };
        assert_eq!(
            err.to_string(),
            "retrieval error for deal (prefix stage): connection reset"
        );
    }

    #[test]
    fn display_timeout() {
        let err = SearchError::Timeout("property exceeded 3000ms".into());
        assert_eq!(err.to_string(), "search timed out: property exceeded 3000ms");
    }

    #[test]
    fn display_cancelled() {
        assert_eq!(SearchError::Cancelled.to_string(), "search cancelled");
    }

    #[test]
    fn display_config() {
        let err = SearchError::Config("overall_limit must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "config error: overall_limit must be greater than 0"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing catalog");
        let err: SearchError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn partial_classification() {
        assert!(SearchError::Timeout("x".into()).is_partial());
        assert!(SearchError::Retrieval {
            entity: EntityKind::Contact,
            stage: MatchStage::Exact,
            message: "x".into(),
        }
        .is_partial());
        assert!(!SearchError::Cancelled.is_partial());
        assert!(!SearchError::Config("x".into()).is_partial());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
