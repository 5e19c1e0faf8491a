//! Stream sink over Redis Streams.
//!
//! Each report becomes one stream entry appended with
//! `XADD <topic> MAXLEN ~ <n> * message <payload>`, so consumers can read the
//! counts with `XREAD` or a consumer group.

use crate::application::ports::{SinkError, StreamSink};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::fmt;

/// Field name under which the payload is stored in each stream entry.
pub const PAYLOAD_FIELD: &str = "message";

/// Default approximate cap on stream length.
pub const DEFAULT_MAX_LEN: usize = 10_000;

/// Publishes payloads as Redis stream entries.
#[derive(Clone)]
pub struct RedisStreamSink {
    connection: ConnectionManager,
    max_len: usize,
}

impl fmt::Debug for RedisStreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStreamSink")
            .field("max_len", &self.max_len)
            .finish_non_exhaustive()
    }
}

impl RedisStreamSink {
    /// Connect to Redis.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self::with_connection(connection))
    }

    /// Build a sink over an existing connection.
    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            max_len: DEFAULT_MAX_LEN,
        }
    }

    /// Trim streams to roughly `max_len` entries on every append.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }
}

#[async_trait]
impl StreamSink for RedisStreamSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SinkError> {
        let mut conn = self.connection.clone();

        let entry_id: String = redis::cmd("XADD")
            .arg(topic)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_len)
            .arg("*")
            .arg(PAYLOAD_FIELD)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| SinkError::Publish(e.to_string()))?;

        tracing::debug!(topic = %topic, entry_id = %entry_id, "Published stream entry");
        Ok(())
    }
}
