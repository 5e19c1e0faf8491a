//! HTTP callback notifier.
//!
//! Sends a single JSON POST to the caller-supplied endpoint:
//!
//! ```text
//! POST <endpoint>
//! Content-Type: application/json
//!
//! {"message": "Unique request data"}
//! ```
//!
//! Any HTTP response counts as delivered and its status is returned, so a
//! non-2xx status is reported rather than treated as a failure.

use crate::application::ports::{NotifyError, Notifier};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;

/// Fixed message sent with every notification.
pub const NOTIFICATION_MESSAGE: &str = "Unique request data";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON body of a notification.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub message: &'static str,
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self {
            message: NOTIFICATION_MESSAGE,
        }
    }
}

/// Notifier that POSTs over HTTP using a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    /// Create a notifier with the default timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a notifier whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Use an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, endpoint: &str) -> Result<u16, NotifyError> {
        let url = Url::parse(endpoint).map_err(|e| NotifyError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .post(url)
            .json(&NotificationPayload::default())
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Endpoint returned non-success status");
        }
        Ok(status.as_u16())
    }
}
