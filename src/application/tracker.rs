//! Uniqueness tracking for the write path.
//!
//! The tracker validates each submitted identifier and asks the dedup store
//! whether it is new for the current window. It never retries: a store
//! failure is surfaced to the caller immediately.

use crate::application::metrics::Metrics;
use crate::application::ports::DedupStore;
use crate::domain::{identifier::Identifier, outcome::Outcome, window::Window};
use tracing::{debug, warn};

/// Decides whether submitted identifiers are accepted or duplicates.
///
/// Many request handlers may call `accept` concurrently. Atomicity for a
/// single identifier is delegated to the store; the tracker holds no locks.
#[derive(Debug, Clone)]
pub struct UniquenessTracker<S>
where
    S: DedupStore,
{
    store: S,
    window: Window,
    metrics: Metrics,
}

impl<S> UniquenessTracker<S>
where
    S: DedupStore,
{
    /// Create a new tracker.
    ///
    /// # Arguments
    /// * `store` - Dedup store holding tracked identifiers
    /// * `window` - TTL applied to every newly tracked identifier
    /// * `metrics` - Metrics tracker
    pub fn new(store: S, window: Window, metrics: Metrics) -> Self {
        Self {
            store,
            window,
            metrics,
        }
    }

    /// Validate `raw` and record it in the dedup store.
    ///
    /// # Returns
    /// - `Outcome::Invalid` if `raw` is not an integer
    /// - `Outcome::StoreError` if the store could not answer
    /// - `Outcome::Duplicate` if the identifier was already tracked
    /// - `Outcome::Accepted` if this call inserted it
    pub async fn accept(&self, raw: &str) -> Outcome {
        let outcome = match Identifier::parse(raw) {
            Ok(id) => self.accept_identifier(id).await,
            Err(e) => {
                debug!(error = %e, "Rejected identifier");
                Outcome::Invalid
            }
        };

        self.metrics.record_outcome(outcome);
        outcome
    }

    async fn accept_identifier(&self, id: Identifier) -> Outcome {
        match self.store.mark_if_absent(id, self.window.ttl()).await {
            Ok(true) => {
                debug!(id = id.value(), "Accepted identifier");
                Outcome::Accepted
            }
            Ok(false) => {
                debug!(id = id.value(), "Duplicate identifier");
                Outcome::Duplicate
            }
            Err(e) => {
                warn!(error = %e, id = id.value(), "Dedup store check failed");
                Outcome::StoreError
            }
        }
    }

    /// Get the dedup window.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the metrics tracker.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
