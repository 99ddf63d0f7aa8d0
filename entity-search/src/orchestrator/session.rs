//! Supersession of in-flight searches.
//!
//! A search box fires a new query on every pause in typing. [`SearchSession`]
//! gives each query its own [`CancellationToken`] and cancels the previous
//! one when a newer query starts, so only the latest query can deliver
//! results.

use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::config::SearchOptions;
use crate::error::SearchError;
use crate::store::RecordStore;

use super::search::{SearchCoordinator, SearchOutcome};

/// A sequence of searches where each new query supersedes the last.
#[derive(Debug)]
pub struct SearchSession<S> {
    coordinator: SearchCoordinator<S>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl<S: RecordStore> SearchSession<S> {
    /// Wraps a coordinator.
    pub fn new(coordinator: SearchCoordinator<S>) -> Self {
        Self {
            coordinator,
            in_flight: Mutex::new(None),
        }
    }

    /// The wrapped coordinator.
    pub fn coordinator(&self) -> &SearchCoordinator<S> {
        &self.coordinator
    }

    /// Start `query`, cancelling whichever search was previously in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cancelled`] if a newer search (or
    /// [`Self::cancel_in_flight`]) supersedes this one before it finishes.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchOutcome, SearchError> {
        let token = self.begin();
        self.coordinator.search(query, options, &token).await
    }

    /// Cancel the current search, if any.
    pub fn cancel_in_flight(&self) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = slot.take() {
            token.cancel();
        }
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(token.clone()) {
            tracing::debug!("superseding in-flight search");
            previous.cancel();
        }
        token
    }
}
