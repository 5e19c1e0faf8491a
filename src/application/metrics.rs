//! Observability metrics for ingestion and aggregation.
//!
//! Counters are updated on every request and every cycle and can be read at
//! any time for monitoring.

use crate::domain::outcome::Outcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking ingestion and aggregation statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    accepted: AtomicU64,
    duplicates: AtomicU64,
    invalid: AtomicU64,
    store_errors: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record the outcome of one ingestion attempt.
    pub(crate) fn record_outcome(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Accepted => &self.inner.accepted,
            Outcome::Duplicate => &self.inner.duplicates,
            Outcome::Invalid => &self.inner.invalid,
            Outcome::StoreError => &self.inner.store_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notification_sent(&self) {
        self.inner
            .notifications_sent
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_notification_failed(&self) {
        self.inner
            .notifications_failed
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cycle_completed(&self) {
        self.inner.cycles_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cycle_failed(&self) {
        self.inner.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of accepted identifiers.
    pub fn accepted(&self) -> u64 {
        self.inner.accepted.load(Ordering::Relaxed)
    }

    /// Get the total number of duplicates rejected.
    pub fn duplicates(&self) -> u64 {
        self.inner.duplicates.load(Ordering::Relaxed)
    }

    /// Get the total number of invalid identifiers rejected.
    pub fn invalid(&self) -> u64 {
        self.inner.invalid.load(Ordering::Relaxed)
    }

    /// Get the total number of store failures on the write path.
    pub fn store_errors(&self) -> u64 {
        self.inner.store_errors.load(Ordering::Relaxed)
    }

    /// Get the number of notifications that received a response.
    pub fn notifications_sent(&self) -> u64 {
        self.inner.notifications_sent.load(Ordering::Relaxed)
    }

    /// Get the number of notifications that failed.
    pub fn notifications_failed(&self) -> u64 {
        self.inner.notifications_failed.load(Ordering::Relaxed)
    }

    /// Get the number of aggregation cycles that completed.
    pub fn cycles_completed(&self) -> u64 {
        self.inner.cycles_completed.load(Ordering::Relaxed)
    }

    /// Get the number of aggregation cycles that were abandoned.
    pub fn cycles_failed(&self) -> u64 {
        self.inner.cycles_failed.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.accepted(),
            duplicates: self.duplicates(),
            invalid: self.invalid(),
            store_errors: self.store_errors(),
            notifications_sent: self.notifications_sent(),
            notifications_failed: self.notifications_failed(),
            cycles_completed: self.cycles_completed(),
            cycles_failed: self.cycles_failed(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        for counter in [
            &self.inner.accepted,
            &self.inner.duplicates,
            &self.inner.invalid,
            &self.inner.store_errors,
            &self.inner.notifications_sent,
            &self.inner.notifications_failed,
            &self.inner.cycles_completed,
            &self.inner.cycles_failed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub accepted: u64,
    pub duplicates: u64,
    pub invalid: u64,
    pub store_errors: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
}

impl MetricsSnapshot {
    /// Total ingestion attempts across all four outcomes.
    pub fn total_requests(&self) -> u64 {
        self.accepted
            .saturating_add(self.duplicates)
            .saturating_add(self.invalid)
            .saturating_add(self.store_errors)
    }

    /// Ratio of duplicates to identifiers that reached the store (0.0 to 1.0).
    ///
    /// Returns 0.0 if nothing reached the store.
    pub fn duplicate_rate(&self) -> f64 {
        let decided = self.accepted.saturating_add(self.duplicates);
        if decided == 0 {
            0.0
        } else {
            self.duplicates as f64 / decided as f64
        }
    }
}
