//! In-process stream sink.

use crate::application::ports::{SinkError, StreamSink};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One published payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Stream sink that forwards payloads to a tokio channel.
///
/// Useful when the consumer lives in the same process, or for wiring reports
/// into another transport. Publishing fails with `SinkError::Closed` once the
/// receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamRecord>,
}

impl ChannelSink {
    /// Create a sink and the receiver that consumes its records.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl StreamSink for ChannelSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SinkError> {
        self.tx
            .send(StreamRecord {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|_| SinkError::Closed)
    }
}
