//! Stream sink and report log doubles.

use crate::application::ports::{ReportLog, ReportLogError, SinkError, StreamSink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Stream sink that keeps every published payload in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All `(topic, payload)` pairs published so far.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published
            .lock()
            .expect("RecordingSink mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }

    /// Payloads decoded as UTF-8 text.
    pub fn published_text(&self) -> Vec<String> {
        self.published()
            .into_iter()
            .map(|(_, payload)| String::from_utf8_lossy(&payload).into_owned())
            .collect()
    }
}

#[async_trait]
impl StreamSink for RecordingSink {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Publish("broker unreachable".to_string()));
        }
        self.published
            .lock()
            .expect("RecordingSink mutex poisoned - a test thread panicked while holding the lock")
            .push((topic.to_string(), payload));
        Ok(())
    }
}

/// Report log that keeps appended lines in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReportLog {
    lines: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryReportLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail.
    pub fn fail_appends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every line appended so far, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .expect("MemoryReportLog mutex poisoned - a test thread panicked while holding the lock")
            .clone()
    }
}

#[async_trait]
impl ReportLog for MemoryReportLog {
    async fn append(&self, line: &str) -> Result<(), ReportLogError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReportLogError::new(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only filesystem",
            )));
        }
        self.lines
            .lock()
            .expect("MemoryReportLog mutex poisoned - a test thread panicked while holding the lock")
            .push(line.to_string());
        Ok(())
    }
}
