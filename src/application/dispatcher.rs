//! Fire-and-forget callback notifications.
//!
//! After an identifier is accepted the caller may ask for a notification to
//! an external endpoint. The notification runs on a detached task: its result
//! is logged and counted, and it can never change the outcome already decided
//! for the request.

use crate::application::metrics::Metrics;
use crate::application::ports::{NotifyError, Notifier};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Dispatches best-effort notifications to caller-supplied endpoints.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    metrics: Metrics,
}

impl NotificationDispatcher {
    /// Create a dispatcher sending through `notifier`.
    pub fn new(notifier: Arc<dyn Notifier>, metrics: Metrics) -> Self {
        Self { notifier, metrics }
    }

    /// Send one notification and wait for it.
    ///
    /// Failures are logged and counted before being returned.
    ///
    /// # Errors
    /// Returns the notifier's error if the request could not be completed.
    pub async fn notify(&self, endpoint: &str) -> Result<u16, NotifyError> {
        let result = self.notifier.notify(endpoint).await;
        match &result {
            Ok(status) => {
                self.metrics.record_notification_sent();
                info!(endpoint = %endpoint, status = *status, "Triggered endpoint");
            }
            Err(e) => {
                self.metrics.record_notification_failed();
                warn!(error = %e, endpoint = %endpoint, "Notification failed");
            }
        }
        result
    }

    /// Send one notification on a detached task.
    ///
    /// Must be called from within a tokio runtime. The returned handle may be
    /// dropped; the task keeps running.
    pub fn dispatch(&self, endpoint: impl Into<String>) -> JoinHandle<()> {
        let dispatcher = self.clone();
        let endpoint = endpoint.into();
        tokio::spawn(async move {
            // Already logged and counted by notify()
            let _ = dispatcher.notify(&endpoint).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::{MockCaptureLayer, MockNotifier};
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    #[tokio::test]
    async fn test_notify_success_is_counted() {
        let notifier = MockNotifier::new();
        let metrics = Metrics::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()), metrics.clone());

        let status = dispatcher.notify("http://callback.local/hook").await.unwrap();

        assert_eq!(status, 200);
        assert_eq!(notifier.calls(), vec!["http://callback.local/hook"]);
        assert_eq!(metrics.notifications_sent(), 1);
        assert_eq!(metrics.notifications_failed(), 0);
    }

    #[tokio::test]
    async fn test_notify_failure_is_logged_and_counted() {
        let capture = MockCaptureLayer::new();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

        let metrics = Metrics::new();
        let dispatcher =
            NotificationDispatcher::new(Arc::new(MockNotifier::failing()), metrics.clone());

        let result = dispatcher.notify("http://callback.local/hook").await;

        assert!(matches!(result, Err(NotifyError::Transport { .. })));
        assert_eq!(metrics.notifications_failed(), 1);
        let warned = capture.matching(Level::WARN, "Notification failed");
        assert_eq!(warned.len(), 1);
        assert_eq!(
            warned[0].fields.get("endpoint").map(String::as_str),
            Some("http://callback.local/hook")
        );
    }

    #[tokio::test]
    async fn test_dispatch_runs_detached() {
        let notifier = MockNotifier::failing();
        let metrics = Metrics::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(notifier.clone()), metrics.clone());

        dispatcher
            .dispatch("http://callback.local/hook")
            .await
            .unwrap();

        assert_eq!(notifier.calls().len(), 1);
        assert_eq!(metrics.notifications_failed(), 1);
    }
}
