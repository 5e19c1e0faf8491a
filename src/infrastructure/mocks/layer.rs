//! Mock tracing layer for asserting on emitted log events.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::Layer;

/// Layer that records every event it sees.
///
/// Best-effort failures (notification, stream publish, log append) are only
/// visible through logs, so tests install this layer to observe them.
#[derive(Clone, Default)]
pub struct MockCaptureLayer {
    captured: Arc<Mutex<Vec<CapturedEvent>>>,
}

/// Captured event information.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl MockCaptureLayer {
    /// Create a new mock capture layer.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CapturedEvent>> {
        self.captured
            .lock()
            .expect("MockCaptureLayer mutex poisoned - a test thread panicked while holding the lock")
    }

    /// Get all captured events.
    pub fn get_captured(&self) -> Vec<CapturedEvent> {
        self.lock().clone()
    }

    /// Get the count of captured events.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Captured events at `level` whose message contains `needle`.
    pub fn matching(&self, level: Level, needle: &str) -> Vec<CapturedEvent> {
        self.lock()
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .cloned()
            .collect()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<S> Layer<S> for MockCaptureLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        self.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl tracing::field::Visit for EventVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .insert(field.name().to_string(), format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_mock_capture_layer() {
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            info!("test message");
            warn!(endpoint = "http://localhost", status = 500u16, "callback failed");
        });

        assert_eq!(capture.count(), 2);
        let events = capture.get_captured();
        assert_eq!(events[0].level, Level::INFO);
        assert_eq!(events[0].message, "test message");

        let warned = capture.matching(Level::WARN, "callback");
        assert_eq!(warned.len(), 1);
        assert_eq!(warned[0].fields.get("endpoint").unwrap(), "http://localhost");
        assert_eq!(warned[0].fields.get("status").unwrap(), "500");

        capture.clear();
        assert_eq!(capture.count(), 0);
    }
}
