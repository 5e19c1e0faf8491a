//! In-process dedup store.
//!
//! Backs the `DedupStore` port with a sharded concurrent map from key to
//! expiry instant. Each insert-if-absent runs under the shard lock for its key,
//! which gives per-key atomicity without any process-wide lock on the write
//! path. Expired records are treated as absent and swept lazily.

use crate::application::ports::{Clock, DedupStore, StoreError};
use crate::domain::identifier::Identifier;
use crate::domain::window::DEFAULT_KEY_PREFIX;
use crate::infrastructure::clock::SystemClock;
use ahash::RandomState;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Thread-safe in-memory dedup store backed by DashMap.
///
/// Suitable for a single process. For state shared across instances use
/// `RedisDedupStore`.
pub struct InMemoryDedupStore {
    records: DashMap<String, Instant, RandomState>,
    clock: Arc<dyn Clock>,
    key_prefix: String,
}

impl fmt::Debug for InMemoryDedupStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDedupStore")
            .field("key_prefix", &self.key_prefix)
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl InMemoryDedupStore {
    /// Create an empty store using the system clock and the default prefix.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create an empty store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::with_hasher(RandomState::new()),
            clock,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Use a custom key namespace.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Number of live (unexpired) records.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.records.iter().filter(|r| *r.value() > now).count()
    }

    /// Check if no live records remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether `id` is currently tracked.
    pub fn contains(&self, id: Identifier) -> bool {
        let now = self.clock.now();
        self.records
            .get(&id.key(&self.key_prefix))
            .is_some_and(|expiry| *expiry > now)
    }

    /// Drop every expired record. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records.retain(|_, expiry| *expiry > now);
        before.saturating_sub(self.records.len())
    }
}

impl Default for InMemoryDedupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn mark_if_absent(&self, id: Identifier, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            StoreError::Backend(format!("expiry overflows the clock for ttl {:?}", ttl))
        })?;

        let inserted = match self.records.entry(id.key(&self.key_prefix)) {
            Entry::Occupied(mut record) => {
                if *record.get() <= now {
                    // Expired records count as absent
                    record.insert(expires_at);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                true
            }
        };

        Ok(inserted)
    }

    async fn list_tracked_keys(&self) -> Result<Vec<String>, StoreError> {
        self.purge_expired();
        let now = self.clock.now();
        Ok(self
            .records
            .iter()
            .filter(|r| *r.value() > now)
            .map(|r| r.key().clone())
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> usize {
        for key in keys {
            self.records.remove(key);
        }
        keys.len()
    }

    fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}
