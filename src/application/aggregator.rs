//! Periodic aggregation of unique identifiers.
//!
//! On every tick the aggregator snapshots the tracked identifiers, reports how
//! many there are, then deletes exactly the snapshot keys. Identifiers accepted
//! after the snapshot are left alone and counted by the next cycle.
//!
//! Cycles are serialized by a single process-wide lock shared by every clone
//! of the aggregator. The write path never takes this lock.

use crate::application::metrics::Metrics;
use crate::application::ports::{DedupStore, ReportLog, StoreError, StreamSink};
use crate::domain::report::AggregateReport;
use crate::domain::window::{DEFAULT_WINDOW, MAX_WINDOW};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default stream topic for aggregate reports.
pub const DEFAULT_TOPIC: &str = "unique-request-count";

/// Error returned when aggregator configuration validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatorConfigError {
    /// Aggregation interval must be greater than zero
    ZeroInterval,
    /// Aggregation interval must not exceed `MAX_WINDOW`
    IntervalTooLong(Duration),
    /// Stream topic must not be empty
    EmptyTopic,
}

impl fmt::Display for AggregatorConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregatorConfigError::ZeroInterval => {
                write!(f, "aggregation interval must be greater than 0")
            }
            AggregatorConfigError::IntervalTooLong(d) => write!(
                f,
                "aggregation interval must be at most {:?}, got {:?}",
                MAX_WINDOW, d
            ),
            AggregatorConfigError::EmptyTopic => write!(f, "stream topic must not be empty"),
        }
    }
}

impl std::error::Error for AggregatorConfigError {}

/// Configuration for the periodic aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// How often a cycle runs
    pub interval: Duration,
    /// Stream topic reports are published to
    pub topic: String,
    /// How long `AggregatorHandle::shutdown` waits for the loop to stop
    pub shutdown_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WINDOW,
            topic: DEFAULT_TOPIC.to_string(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl AggregatorConfig {
    /// Create a config with the specified interval.
    ///
    /// # Errors
    /// Returns `AggregatorConfigError::ZeroInterval` if `interval` is zero, or
    /// `AggregatorConfigError::IntervalTooLong` if it exceeds `MAX_WINDOW`.
    pub fn new(interval: Duration) -> Result<Self, AggregatorConfigError> {
        if interval.is_zero() {
            return Err(AggregatorConfigError::ZeroInterval);
        }
        if interval > MAX_WINDOW {
            return Err(AggregatorConfigError::IntervalTooLong(interval));
        }
        Ok(Self {
            interval,
            ..Self::default()
        })
    }

    /// Set the stream topic.
    ///
    /// # Errors
    /// Returns `AggregatorConfigError::EmptyTopic` if `topic` is empty.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Result<Self, AggregatorConfigError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(AggregatorConfigError::EmptyTopic);
        }
        self.topic = topic;
        Ok(self)
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Aggregator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Waiting for the next tick
    Idle = 0,
    /// Draining the current window
    Aggregating = 1,
}

impl From<u8> for AggregatorState {
    fn from(value: u8) -> Self {
        match value {
            1 => AggregatorState::Aggregating,
            _ => AggregatorState::Idle,
        }
    }
}

/// Error that abandons a single aggregation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationCycleError {
    /// Tracked identifiers could not be enumerated
    Enumerate(StoreError),
}

impl fmt::Display for AggregationCycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationCycleError::Enumerate(e) => {
                write!(f, "failed to enumerate tracked identifiers: {}", e)
            }
        }
    }
}

impl std::error::Error for AggregationCycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregationCycleError::Enumerate(e) => Some(e),
        }
    }
}

/// Error returned when the aggregation loop fails to stop cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownError {
    /// The loop panicked
    TaskPanicked,
    /// The loop was aborted before it could finish
    TaskCancelled,
    /// The loop did not stop within the timeout and was aborted
    Timeout(Duration),
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownError::TaskPanicked => write!(f, "aggregator task panicked"),
            ShutdownError::TaskCancelled => write!(f, "aggregator task was cancelled"),
            ShutdownError::Timeout(d) => {
                write!(f, "aggregator task did not stop within {:?}", d)
            }
        }
    }
}

impl std::error::Error for ShutdownError {}

/// Resets the state to `Idle` even if a cycle is cancelled mid-flight.
struct AggregatingGuard<'a>(&'a AtomicU8);

impl<'a> AggregatingGuard<'a> {
    fn enter(state: &'a AtomicU8) -> Self {
        state.store(AggregatorState::Aggregating as u8, Ordering::Release);
        Self(state)
    }
}

impl Drop for AggregatingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(AggregatorState::Idle as u8, Ordering::Release);
    }
}

/// Counts, reports and clears tracked identifiers on a fixed cadence.
#[derive(Debug, Clone)]
pub struct PeriodicAggregator<S>
where
    S: DedupStore,
{
    store: S,
    sink: Option<Arc<dyn StreamSink>>,
    report_log: Option<Arc<dyn ReportLog>>,
    config: AggregatorConfig,
    metrics: Metrics,
    cycle_lock: Arc<Mutex<()>>,
    state: Arc<AtomicU8>,
}

impl<S> PeriodicAggregator<S>
where
    S: DedupStore,
{
    /// Create an aggregator with no sinks attached.
    pub fn new(store: S, config: AggregatorConfig, metrics: Metrics) -> Self {
        Self {
            store,
            sink: None,
            report_log: None,
            config,
            metrics,
            cycle_lock: Arc::new(Mutex::new(())),
            state: Arc::new(AtomicU8::new(AggregatorState::Idle as u8)),
        }
    }

    /// Publish reports to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn StreamSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Append reports to `report_log`.
    pub fn with_report_log(mut self, report_log: Arc<dyn ReportLog>) -> Self {
        self.report_log = Some(report_log);
        self
    }

    /// Get the current state.
    pub fn state(&self) -> AggregatorState {
        AggregatorState::from(self.state.load(Ordering::Acquire))
    }

    /// Get the aggregator configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Run one aggregation cycle now.
    ///
    /// Waits for any cycle already in progress to finish first. Failures are
    /// logged and counted before being returned.
    ///
    /// # Errors
    /// Returns `AggregationCycleError::Enumerate` if the snapshot could not be
    /// taken; nothing is reported or deleted in that case.
    pub async fn run_cycle(&self) -> Result<AggregateReport, AggregationCycleError> {
        let _lock = self.cycle_lock.lock().await;
        let _state = AggregatingGuard::enter(&self.state);

        let result = self.drain().await;
        match &result {
            Ok(report) => {
                self.metrics.record_cycle_completed();
                debug!(
                    count = report.count,
                    cleared = report.cleared,
                    "Aggregation cycle complete"
                );
            }
            Err(e) => {
                self.metrics.record_cycle_failed();
                warn!(error = %e, "Aggregation cycle skipped");
            }
        }
        result
    }

    async fn drain(&self) -> Result<AggregateReport, AggregationCycleError> {
        let snapshot = self
            .store
            .list_tracked_keys()
            .await
            .map_err(AggregationCycleError::Enumerate)?;

        let mut report = AggregateReport::new(snapshot.len(), SystemTime::now());
        info!(count = report.count, "Sending unique request count");
        self.emit(&report).await;

        // Delete the snapshot only; keys inserted since then belong to the next cycle
        report.cleared = self.store.delete(&snapshot).await;
        if report.uncleared() > 0 {
            warn!(
                uncleared = report.uncleared(),
                "Some tracked identifiers were not cleared and will expire by TTL"
            );
        }

        Ok(report)
    }

    async fn emit(&self, report: &AggregateReport) {
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.publish(&self.config.topic, report.to_payload()).await {
                warn!(error = %e, topic = %self.config.topic, "Failed to publish unique request count");
            }
        }

        if let Some(report_log) = &self.report_log {
            if let Err(e) = report_log.append(&report.line()).await {
                warn!(error = %e, "Failed to write unique request count to report log");
            }
        }
    }

    /// Start running cycles periodically.
    ///
    /// The first cycle runs one full interval after this call. Ticks missed
    /// while a slow cycle runs are skipped rather than replayed. If
    /// `drain_on_shutdown` is set, one final cycle runs when the handle is
    /// shut down.
    ///
    /// Dropping the returned handle does not stop the loop; call
    /// `AggregatorHandle::shutdown`.
    pub fn start(self, drain_on_shutdown: bool) -> AggregatorHandle
    where
        S: 'static,
    {
        let shutdown = Arc::new(Notify::new());
        let stop = Arc::clone(&shutdown);
        // `interval` is a public field, so it may bypass `AggregatorConfig::new`
        let period = self
            .config
            .interval
            .clamp(Duration::from_millis(1), MAX_WINDOW);
        let shutdown_timeout = self.config.shutdown_timeout;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Failures are logged inside run_cycle; the loop keeps going
                        let _ = self.run_cycle().await;
                    }
                    _ = stop.notified() => {
                        if drain_on_shutdown {
                            let _ = self.run_cycle().await;
                        }
                        break;
                    }
                }
            }

            debug!("Aggregator stopped");
        });

        AggregatorHandle {
            shutdown,
            task,
            shutdown_timeout,
        }
    }
}

/// Handle to a running aggregation loop.
#[derive(Debug)]
pub struct AggregatorHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
    shutdown_timeout: Duration,
}

impl AggregatorHandle {
    /// Stop the loop and wait for it to finish.
    ///
    /// A cycle already in progress completes first.
    ///
    /// # Errors
    /// Returns `ShutdownError` if the task panicked, was aborted, or did not
    /// stop within the configured timeout (in which case it is aborted).
    pub async fn shutdown(mut self) -> Result<(), ShutdownError> {
        self.shutdown.notify_one();

        match tokio::time::timeout(self.shutdown_timeout, &mut self.task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.is_panic() => Err(ShutdownError::TaskPanicked),
            Ok(Err(_)) => Err(ShutdownError::TaskCancelled),
            Err(_) => {
                self.task.abort();
                Err(ShutdownError::Timeout(self.shutdown_timeout))
            }
        }
    }

    /// Check whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the loop immediately, cancelling any cycle in progress.
    pub fn abort(&self) {
        self.task.abort();
    }
}
