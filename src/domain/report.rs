//! Aggregate reports produced by each aggregation cycle.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Prefix of every report line written to the durable log and stream sink.
pub const REPORT_LINE_PREFIX: &str = "Unique request count in last minute: ";

/// The result of one aggregation cycle.
///
/// A report is emitted once and never retained: it is handed to the stream
/// sink and the durable log, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    /// Number of distinct identifiers tracked when the snapshot was taken
    pub count: usize,
    /// Wall-clock time the snapshot was taken
    pub taken_at: SystemTime,
    /// Number of snapshot keys the store confirmed as deleted
    pub cleared: usize,
}

impl AggregateReport {
    /// Create a report for a snapshot of `count` identifiers.
    pub fn new(count: usize, taken_at: SystemTime) -> Self {
        Self {
            count,
            taken_at,
            cleared: 0,
        }
    }

    /// Format the report as a single line, without the trailing newline.
    ///
    /// ```
    /// use request_dedup::AggregateReport;
    /// use std::time::SystemTime;
    ///
    /// let report = AggregateReport::new(3, SystemTime::now());
    /// assert_eq!(report.line(), "Unique request count in last minute: 3");
    /// ```
    pub fn line(&self) -> String {
        format!("{}{}", REPORT_LINE_PREFIX, self.count)
    }

    /// Payload published to the stream sink.
    pub fn to_payload(&self) -> Vec<u8> {
        self.line().into_bytes()
    }

    /// Milliseconds since the Unix epoch at which the snapshot was taken.
    pub fn taken_at_millis(&self) -> u128 {
        self.taken_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis()
    }

    /// Number of snapshot keys that could not be deleted.
    pub fn uncleared(&self) -> usize {
        self.count.saturating_sub(self.cleared)
    }
}
