//! Notifier double.

use crate::application::ports::{NotifyError, Notifier};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Notifier that records endpoints instead of sending requests.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    calls: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
    called: Arc<Notify>,
}

impl MockNotifier {
    /// Create a notifier that succeeds with status 200.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier that always fails.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    /// Endpoints notified so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("MockNotifier mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Wait until at least one more notification has been attempted.
    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, endpoint: &str) -> Result<u16, NotifyError> {
        self.calls
            .lock()
            .expect("MockNotifier mutex poisoned - a test thread panicked while holding the lock")
            .push(endpoint.to_string());
        self.called.notify_one();

        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(200)
    }
}
