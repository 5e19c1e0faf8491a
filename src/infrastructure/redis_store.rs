//! Redis-backed dedup store.
//!
//! Shares tracked identifiers across every service instance pointed at the
//! same Redis.
//!
//! ## Data model
//!
//! - Key: `<prefix><identifier>`, e.g. `request_id:42`
//! - Value: the sentinel `1`
//! - Expiry: the dedup window, set atomically with the insert
//!
//! `mark_if_absent` is a single `SET key 1 NX PX <ttl>`, so concurrent
//! handlers on any instance race inside Redis and exactly one sees the insert.
//! Enumeration walks the namespace with `SCAN`, never `KEYS`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use request_dedup::{RedisDedupStore, RedisStoreConfig, RequestDedupService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = RedisDedupStore::connect_with_config(
//!         "redis://127.0.0.1/",
//!         RedisStoreConfig::default(),
//!     )
//!     .await
//!     .expect("Failed to connect to Redis");
//!
//!     let service = RequestDedupService::builder()
//!         .build_with_store(store)
//!         .unwrap();
//! }
//! ```

use crate::application::ports::{DedupStore, StoreError};
use crate::domain::identifier::Identifier;
use crate::domain::window::DEFAULT_KEY_PREFIX;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::fmt;
use std::time::Duration;

/// Configuration for the Redis dedup store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for tracked identifiers (default: "request_id:")
    pub key_prefix: String,
    /// `COUNT` hint passed to each `SCAN` call (default: 100)
    pub scan_count: usize,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            scan_count: 100,
        }
    }
}

/// Dedup store backed by a Redis server.
///
/// Cloning is cheap: clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisDedupStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
    match_pattern: String,
}

impl fmt::Debug for RedisDedupStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisDedupStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisDedupStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisStoreConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisStoreConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self::with_connection(connection, config))
    }

    /// Build a store over an existing connection.
    pub fn with_connection(connection: ConnectionManager, config: RedisStoreConfig) -> Self {
        let match_pattern = format!("{}*", escape_glob(&config.key_prefix));
        Self {
            connection,
            config,
            match_pattern,
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }
}

#[async_trait]
impl DedupStore for RedisDedupStore {
    async fn mark_if_absent(&self, id: Identifier, ttl: Duration) -> Result<bool, StoreError> {
        let key = id.key(&self.config.key_prefix);
        let ttl_ms = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
        let mut conn = self.connection.clone();

        // SET NX replies OK on insert and nil when the key exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(1)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(reply.is_some())
    }

    async fn list_tracked_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&self.match_pattern)
                .arg("COUNT")
                .arg(self.config.scan_count)
                .query_async(&mut conn)
                .await
                .map_err(store_error)?;

            keys.extend(batch);

            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once across iterations
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn delete(&self, keys: &[String]) -> usize {
        let mut conn = self.connection.clone();
        let mut deleted = 0;

        for key in keys {
            let result: Result<usize, RedisError> =
                redis::cmd("DEL").arg(key).query_async(&mut conn).await;
            match result {
                Ok(_) => deleted += 1,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Failed to delete tracked key");
                }
            }
        }

        deleted
    }

    fn key_prefix(&self) -> &str {
        &self.config.key_prefix
    }
}

fn store_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout()
    {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

/// Escape glob metacharacters so the prefix matches literally in `SCAN MATCH`.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RedisStoreConfig::default();
        assert_eq!(config.key_prefix, "request_id:");
        assert_eq!(config.scan_count, 100);
    }

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("request_id:"), "request_id:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }
}
