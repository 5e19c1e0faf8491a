//! Assembled dedup service.
//!
//! Wires the tracker, notification dispatcher and periodic aggregator around
//! one dedup store and exposes the two operations a transport layer needs:
//! `ingest` per request and `shutdown` on exit.

use crate::application::aggregator::{
    AggregationCycleError, AggregatorConfig, AggregatorConfigError, AggregatorHandle,
    AggregatorState, PeriodicAggregator, ShutdownError, DEFAULT_TOPIC,
};
use crate::application::dispatcher::NotificationDispatcher;
use crate::application::ingest::IngestService;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, DedupStore, Notifier, ReportLog, StreamSink};
use crate::application::tracker::UniquenessTracker;
use crate::domain::outcome::Outcome;
use crate::domain::report::AggregateReport;
use crate::domain::window::{Window, WindowError, DEFAULT_KEY_PREFIX, DEFAULT_WINDOW};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory_store::InMemoryDedupStore;
use std::sync::Arc;
use std::time::Duration;

/// Error returned when building a service fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Window validation failed
    Window(WindowError),
    /// Aggregator configuration validation failed
    AggregatorConfig(AggregatorConfigError),
    /// Key prefix must not be empty
    EmptyKeyPrefix,
    /// Background aggregation was requested outside a tokio runtime
    NoRuntime,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Window(e) => write!(f, "window configuration error: {}", e),
            BuildError::AggregatorConfig(e) => {
                write!(f, "aggregator configuration error: {}", e)
            }
            BuildError::EmptyKeyPrefix => write!(f, "key prefix must not be empty"),
            BuildError::NoRuntime => {
                write!(f, "background aggregation requires a running tokio runtime")
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<WindowError> for BuildError {
    fn from(e: WindowError) -> Self {
        BuildError::Window(e)
    }
}

impl From<AggregatorConfigError> for BuildError {
    fn from(e: AggregatorConfigError) -> Self {
        BuildError::AggregatorConfig(e)
    }
}

/// Builder for constructing a `RequestDedupService`.
pub struct RequestDedupServiceBuilder {
    window: Duration,
    interval: Duration,
    key_prefix: String,
    topic: String,
    shutdown_timeout: Option<Duration>,
    clock: Option<Arc<dyn Clock>>,
    sink: Option<Arc<dyn StreamSink>>,
    report_log: Option<Arc<dyn ReportLog>>,
    notifier: Option<Arc<dyn Notifier>>,
    background_aggregation: bool,
    drain_on_shutdown: bool,
}

impl Default for RequestDedupServiceBuilder {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            interval: DEFAULT_WINDOW,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            shutdown_timeout: None,
            clock: None,
            sink: None,
            report_log: None,
            notifier: None,
            background_aggregation: true,
            drain_on_shutdown: false,
        }
    }
}

impl RequestDedupServiceBuilder {
    /// Set how long an accepted identifier blocks duplicates (default: 60s).
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the aggregation period (default: 60s).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the key namespace of the built-in in-memory store.
    ///
    /// Ignored by `build_with_store`; a custom store carries its own prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the stream topic reports are published to.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set how long `shutdown` waits for the aggregator to stop.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Set a custom clock for the built-in in-memory store.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Publish each report to a stream sink.
    pub fn with_sink(mut self, sink: Arc<dyn StreamSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Append each report to a durable log.
    pub fn with_report_log(mut self, report_log: Arc<dyn ReportLog>) -> Self {
        self.report_log = Some(report_log);
        self
    }

    /// Enable callback notifications for accepted identifiers.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run aggregation cycles on a background task (default: enabled).
    ///
    /// When disabled, cycles only run through `RequestDedupService::run_cycle`.
    pub fn with_background_aggregation(mut self, enabled: bool) -> Self {
        self.background_aggregation = enabled;
        self
    }

    /// Run one final cycle during shutdown (default: disabled).
    pub fn with_drain_on_shutdown(mut self, enabled: bool) -> Self {
        self.drain_on_shutdown = enabled;
        self
    }

    /// Build the service over an in-memory store.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid, or if background
    /// aggregation is enabled and no tokio runtime is running.
    pub fn build(self) -> Result<RequestDedupService<Arc<InMemoryDedupStore>>, BuildError> {
        if self.key_prefix.is_empty() {
            return Err(BuildError::EmptyKeyPrefix);
        }

        let clock = self
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        let store = Arc::new(
            InMemoryDedupStore::with_clock(clock).with_key_prefix(self.key_prefix.clone()),
        );
        self.build_with_store(store)
    }

    /// Build the service over a custom store, e.g. `RedisDedupStore`.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid, or if background
    /// aggregation is enabled and no tokio runtime is running.
    pub fn build_with_store<S>(self, store: S) -> Result<RequestDedupService<S>, BuildError>
    where
        S: DedupStore + Clone + 'static,
    {
        let window = Window::new(self.window)?;

        let mut config = AggregatorConfig::new(self.interval)?.with_topic(self.topic)?;
        if let Some(timeout) = self.shutdown_timeout {
            config = config.with_shutdown_timeout(timeout);
        }

        if self.background_aggregation && tokio::runtime::Handle::try_current().is_err() {
            return Err(BuildError::NoRuntime);
        }

        let metrics = Metrics::new();

        let tracker = UniquenessTracker::new(store.clone(), window, metrics.clone());
        let dispatcher = self
            .notifier
            .map(|notifier| NotificationDispatcher::new(notifier, metrics.clone()));
        let ingest = IngestService::new(tracker, dispatcher);

        let mut aggregator = PeriodicAggregator::new(store, config, metrics.clone());
        if let Some(sink) = self.sink {
            aggregator = aggregator.with_sink(sink);
        }
        if let Some(report_log) = self.report_log {
            aggregator = aggregator.with_report_log(report_log);
        }

        let mut service = RequestDedupService {
            ingest,
            aggregator,
            handle: None,
            metrics,
        };

        if self.background_aggregation {
            service.start_aggregator(self.drain_on_shutdown);
        }

        Ok(service)
    }
}

/// Request deduplication and per-window counting.
///
/// # Example
///
/// ```rust,no_run
/// use request_dedup::{FileReportLog, Outcome, RequestDedupService};
/// use std::sync::Arc;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let service = RequestDedupService::builder()
///     .with_report_log(Arc::new(FileReportLog::default()))
///     .build()?;
///
/// assert_eq!(service.ingest("42", None).await, Outcome::Accepted);
/// assert_eq!(service.ingest("42", None).await, Outcome::Duplicate);
///
/// service.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestDedupService<S = Arc<InMemoryDedupStore>>
where
    S: DedupStore,
{
    ingest: IngestService<S>,
    aggregator: PeriodicAggregator<S>,
    handle: Option<AggregatorHandle>,
    metrics: Metrics,
}

impl RequestDedupService<Arc<InMemoryDedupStore>> {
    /// Create a builder with default settings.
    pub fn builder() -> RequestDedupServiceBuilder {
        RequestDedupServiceBuilder::default()
    }
}

impl<S> RequestDedupService<S>
where
    S: DedupStore + Clone + 'static,
{
    /// Handle one request. See `IngestService::ingest`.
    pub async fn ingest(&self, id: &str, endpoint: Option<&str>) -> Outcome {
        self.ingest.ingest(id, endpoint).await
    }

    /// Run one aggregation cycle immediately.
    ///
    /// Serialized with background cycles.
    ///
    /// # Errors
    /// Returns `AggregationCycleError` if the cycle was skipped.
    pub async fn run_cycle(&self) -> Result<AggregateReport, AggregationCycleError> {
        self.aggregator.run_cycle().await
    }

    /// Start background aggregation if it is not already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_aggregator(&mut self, drain_on_shutdown: bool) {
        if self.handle.is_none() {
            self.handle = Some(self.aggregator.clone().start(drain_on_shutdown));
        }
    }

    /// Check whether background aggregation is running.
    pub fn is_aggregating_in_background(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Get the aggregator state.
    pub fn aggregator_state(&self) -> AggregatorState {
        self.aggregator.state()
    }

    /// Get the shared metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get the dedup store.
    pub fn store(&self) -> &S {
        self.ingest.tracker().store()
    }

    /// Stop background aggregation.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the background task did not stop cleanly.
    pub async fn shutdown(self) -> Result<(), ShutdownError> {
        match self.handle {
            Some(handle) => handle.shutdown().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::{MemoryReportLog, MockClock, MockNotifier, RecordingSink};
    use std::time::Instant;

    #[tokio::test]
    async fn test_default_build() {
        let service = RequestDedupService::builder().build().unwrap();

        assert!(service.is_aggregating_in_background());
        assert_eq!(service.store().key_prefix(), "request_id:");
        assert_eq!(service.ingest("1", None).await, Outcome::Accepted);

        service.shutdown().await.unwrap();
    }

    #[test]
    fn test_background_aggregation_needs_runtime() {
        let result = RequestDedupService::builder().build();
        assert_eq!(result.unwrap_err(), BuildError::NoRuntime);

        let result = RequestDedupService::builder()
            .with_background_aggregation(false)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_configuration() {
        let builder = || RequestDedupService::builder().with_background_aggregation(false);

        assert_eq!(
            builder().with_interval(Duration::ZERO).build().unwrap_err(),
            BuildError::AggregatorConfig(AggregatorConfigError::ZeroInterval)
        );
        assert_eq!(
            builder().with_window(Duration::ZERO).build().unwrap_err(),
            BuildError::Window(WindowError::TooShort(Duration::ZERO))
        );
        let huge = Duration::from_secs(u64::MAX / 2);
        assert_eq!(
            builder().with_window(huge).build().unwrap_err(),
            BuildError::Window(WindowError::TooLong(huge))
        );
        assert_eq!(
            builder().with_interval(huge).build().unwrap_err(),
            BuildError::AggregatorConfig(AggregatorConfigError::IntervalTooLong(huge))
        );
        assert_eq!(
            builder().with_key_prefix("").build().unwrap_err(),
            BuildError::EmptyKeyPrefix
        );
        assert_eq!(
            builder().with_topic("").build().unwrap_err(),
            BuildError::AggregatorConfig(AggregatorConfigError::EmptyTopic)
        );
    }

    #[tokio::test]
    async fn test_ingest_then_cycle() {
        let sink = RecordingSink::new();
        let log = MemoryReportLog::new();
        let service = RequestDedupService::builder()
            .with_sink(Arc::new(sink.clone()))
            .with_report_log(Arc::new(log.clone()))
            .with_topic("counts")
            .with_background_aggregation(false)
            .build()
            .unwrap();

        for id in ["1", "2", "2", "x", "3"] {
            service.ingest(id, None).await;
        }
        let report = service.run_cycle().await.unwrap();

        assert_eq!(report.count, 3);
        assert_eq!(log.lines(), vec!["Unique request count in last minute: 3"]);
        assert_eq!(sink.published()[0].0, "counts");

        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.accepted, 3);
        assert_eq!(snapshot.duplicates, 1);
        assert_eq!(snapshot.invalid, 1);
        assert_eq!(snapshot.cycles_completed, 1);

        // Identifiers from the previous window are accepted again
        assert_eq!(service.ingest("2", None).await, Outcome::Accepted);
    }

    #[tokio::test]
    async fn test_window_uses_clock() {
        let clock = MockClock::new(Instant::now());
        let service = RequestDedupService::builder()
            .with_clock(Arc::new(clock.clone()))
            .with_window(Duration::from_secs(10))
            .with_background_aggregation(false)
            .build()
            .unwrap();

        assert_eq!(service.ingest("7", None).await, Outcome::Accepted);
        clock.advance(Duration::from_secs(5));
        assert_eq!(service.ingest("7", None).await, Outcome::Duplicate);
        clock.advance(Duration::from_secs(6));
        assert_eq!(service.ingest("7", None).await, Outcome::Accepted);
    }

    #[tokio::test]
    async fn test_notifier_wired() {
        let notifier = MockNotifier::new();
        let service = RequestDedupService::builder()
            .with_notifier(Arc::new(notifier.clone()))
            .with_background_aggregation(false)
            .build()
            .unwrap();

        service.ingest("1", Some("http://cb.local/")).await;
        notifier.wait_for_call().await;

        assert_eq!(notifier.calls(), vec!["http://cb.local/"]);
    }

    #[tokio::test]
    async fn test_drain_on_shutdown() {
        let log = MemoryReportLog::new();
        let service = RequestDedupService::builder()
            .with_report_log(Arc::new(log.clone()))
            .with_interval(Duration::from_secs(3600))
            .with_drain_on_shutdown(true)
            .build()
            .unwrap();

        service.ingest("1", None).await;
        service.ingest("2", None).await;
        service.shutdown().await.unwrap();

        assert_eq!(log.lines(), vec!["Unique request count in last minute: 2"]);
    }
}
