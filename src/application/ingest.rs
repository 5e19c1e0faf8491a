//! The ingestion call.
//!
//! This is the function a transport layer invokes for each inbound request:
//! it runs the uniqueness check and, for accepted identifiers, fires the
//! optional callback notification.

use crate::application::dispatcher::NotificationDispatcher;
use crate::application::ports::DedupStore;
use crate::application::tracker::UniquenessTracker;
use crate::domain::outcome::Outcome;
use tracing::debug;

/// Entry point for inbound requests.
#[derive(Debug, Clone)]
pub struct IngestService<S>
where
    S: DedupStore,
{
    tracker: UniquenessTracker<S>,
    dispatcher: Option<NotificationDispatcher>,
}

impl<S> IngestService<S>
where
    S: DedupStore,
{
    /// Create an ingestion service. Without a dispatcher, callback endpoints
    /// are ignored.
    pub fn new(tracker: UniquenessTracker<S>, dispatcher: Option<NotificationDispatcher>) -> Self {
        Self {
            tracker,
            dispatcher,
        }
    }

    /// Handle one request.
    ///
    /// # Arguments
    /// * `id` - Identifier token as received
    /// * `endpoint` - Optional callback URL notified when the identifier is accepted
    ///
    /// The returned outcome is decided before any notification is sent, and a
    /// failed notification does not change it.
    pub async fn ingest(&self, id: &str, endpoint: Option<&str>) -> Outcome {
        let outcome = self.tracker.accept(id).await;

        if outcome.is_accepted() {
            if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
                match &self.dispatcher {
                    Some(dispatcher) => {
                        dispatcher.dispatch(endpoint);
                    }
                    None => debug!(endpoint = %endpoint, "No notifier configured, skipping callback"),
                }
            }
        }

        outcome
    }

    /// Get the underlying tracker.
    pub fn tracker(&self) -> &UniquenessTracker<S> {
        &self.tracker
    }
}
