//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports: the dedup store
//! (in-memory or Redis), the stream sink, the durable report log and the
//! notification client.

use crate::domain::identifier::Identifier;
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Port for obtaining current time.
///
/// Lets the in-memory store compute expiry without depending on the system
/// clock directly. Infrastructure provides `SystemClock` and `MockClock`.
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Error raised by a dedup store adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    Unavailable(String),
    /// The store answered with an error or an unexpected reply
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "dedup store unavailable: {}", msg),
            StoreError::Backend(msg) => write!(f, "dedup store error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Port for the external dedup store.
///
/// The store owns every tracked identifier record. No other component mutates
/// records except through these operations.
#[async_trait]
pub trait DedupStore: Send + Sync + Debug {
    /// Atomically insert the key for `id` with expiry `ttl` if it is absent.
    ///
    /// Returns `true` if this call performed the insert (the identifier is new
    /// for the window) and `false` if the key already existed. Concurrent
    /// calls for the same identifier never both observe `true`.
    async fn mark_if_absent(&self, id: Identifier, ttl: Duration) -> Result<bool, StoreError>;

    /// Snapshot every live key under this store's namespace.
    ///
    /// The snapshot is not atomic against concurrent inserts.
    async fn list_tracked_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Remove the given keys.
    ///
    /// Best-effort: a failure on one key is logged and the rest of the batch
    /// is still attempted. Returns the number of keys removed.
    async fn delete(&self, keys: &[String]) -> usize;

    /// Namespace prefix prepended to every identifier key.
    fn key_prefix(&self) -> &str;
}

#[async_trait]
impl<T> DedupStore for Arc<T>
where
    T: DedupStore + ?Sized,
{
    async fn mark_if_absent(&self, id: Identifier, ttl: Duration) -> Result<bool, StoreError> {
        (**self).mark_if_absent(id, ttl).await
    }

    async fn list_tracked_keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_tracked_keys().await
    }

    async fn delete(&self, keys: &[String]) -> usize {
        (**self).delete(keys).await
    }

    fn key_prefix(&self) -> &str {
        (**self).key_prefix()
    }
}

/// Error raised when publishing to a stream sink fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink is closed and accepts no more payloads
    Closed,
    /// The sink rejected or failed to deliver the payload
    Publish(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Closed => write!(f, "stream sink is closed"),
            SinkError::Publish(msg) => write!(f, "stream publish failed: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// Port for an append-only stream of opaque payloads.
///
/// Delivery is fire-and-forget from the caller's point of view: errors are
/// reported so they can be logged, never retried.
#[async_trait]
pub trait StreamSink: Send + Sync + Debug {
    /// Append `payload` to `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SinkError>;
}

/// Error raised when appending to the durable report log fails.
#[derive(Debug)]
pub struct ReportLogError {
    source: std::io::Error,
}

impl ReportLogError {
    /// Wrap an I/O error.
    pub fn new(source: std::io::Error) -> Self {
        Self { source }
    }
}

impl fmt::Display for ReportLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to append report line: {}", self.source)
    }
}

impl std::error::Error for ReportLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<std::io::Error> for ReportLogError {
    fn from(source: std::io::Error) -> Self {
        Self::new(source)
    }
}

/// Port for the durable, append-only report log.
#[async_trait]
pub trait ReportLog: Send + Sync + Debug {
    /// Append one line. The adapter adds the trailing newline.
    async fn append(&self, line: &str) -> Result<(), ReportLogError>;
}

/// Error raised when a callback notification fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The endpoint is not a usable URL
    InvalidEndpoint { endpoint: String, reason: String },
    /// The request could not be sent or no response was received
    Transport { endpoint: String, reason: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::InvalidEndpoint { endpoint, reason } => {
                write!(f, "invalid notification endpoint {}: {}", endpoint, reason)
            }
            NotifyError::Transport { endpoint, reason } => {
                write!(f, "notification to {} failed: {}", endpoint, reason)
            }
        }
    }
}

impl std::error::Error for NotifyError {}

/// Port for the callback notification client.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    /// Send one notification to `endpoint` and return the response status.
    ///
    /// A single attempt is made; there are no retries.
    async fn notify(&self, endpoint: &str) -> Result<u16, NotifyError>;
}
