//! Dedup store double with switchable failures.

use crate::application::ports::{DedupStore, StoreError};
use crate::domain::identifier::Identifier;
use crate::infrastructure::memory_store::InMemoryDedupStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// An in-memory store whose operations can be made to fail on demand.
///
/// Simulates an unreachable external store without a network.
#[derive(Debug, Clone)]
pub struct FailingStore {
    inner: Arc<InMemoryDedupStore>,
    fail_marks: Arc<AtomicBool>,
    fail_lists: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl FailingStore {
    /// Wrap a fresh in-memory store. Nothing fails until switched on.
    pub fn new() -> Self {
        Self::wrap(Arc::new(InMemoryDedupStore::new()))
    }

    /// Wrap an existing in-memory store.
    pub fn wrap(inner: Arc<InMemoryDedupStore>) -> Self {
        Self {
            inner,
            fail_marks: Arc::new(AtomicBool::new(false)),
            fail_lists: Arc::new(AtomicBool::new(false)),
            fail_deletes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make `mark_if_absent` fail.
    pub fn fail_marks(&self, fail: bool) {
        self.fail_marks.store(fail, Ordering::SeqCst);
    }

    /// Make `list_tracked_keys` fail.
    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Make every per-key delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store.
    pub fn inner(&self) -> &InMemoryDedupStore {
        &self.inner
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for FailingStore {
    async fn mark_if_absent(&self, id: Identifier, ttl: Duration) -> Result<bool, StoreError> {
        if self.fail_marks.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.mark_if_absent(id, ttl).await
    }

    async fn list_tracked_keys(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.list_tracked_keys().await
    }

    async fn delete(&self, keys: &[String]) -> usize {
        if self.fail_deletes.load(Ordering::SeqCst) {
            for key in keys {
                tracing::warn!(key = %key, "Failed to delete tracked key");
            }
            return 0;
        }
        self.inner.delete(keys).await
    }

    fn key_prefix(&self) -> &str {
        self.inner.key_prefix()
    }
}
