//! # request-dedup
//!
//! Windowed request deduplication with periodic unique-count aggregation.
//!
//! Every inbound request carries an integer identifier. The first occurrence of
//! an identifier within the dedup window is **accepted**; repeats are reported
//! as **duplicates**. Once per window a background aggregator counts the
//! distinct identifiers seen, publishes the count to a stream sink, appends it
//! to a durable log and clears the window so counting starts fresh.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use request_dedup::{FileReportLog, HttpNotifier, Outcome, RequestDedupService};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RequestDedupService::builder()
//!     .with_report_log(Arc::new(FileReportLog::default()))
//!     .with_notifier(Arc::new(HttpNotifier::new()?))
//!     .build()?;
//!
//! match service.ingest("42", Some("http://callback.local/hook")).await {
//!     Outcome::Accepted | Outcome::Duplicate => println!("ok"),
//!     Outcome::Invalid | Outcome::StoreError => println!("failed"),
//! }
//!
//! service.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Outcomes
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | `Accepted` | First time this identifier was seen in the current window |
//! | `Duplicate` | Already seen in the current window |
//! | `Invalid` | The identifier is not a signed 64-bit integer |
//! | `StoreError` | The dedup store could not answer; nothing was recorded |
//!
//! Equivalent spellings of one integer (`5`, `+5`, `005`) are the same
//! identifier.
//!
//! ## Window Semantics
//!
//! Two mechanisms bound the window and they are not synchronized:
//!
//! - each accepted identifier is stored with a TTL equal to the window
//! - each aggregation cycle deletes exactly the keys it counted
//!
//! An identifier accepted just after a snapshot survives that cycle and is
//! counted by the next one. An identifier that expires by TTL before a
//! snapshot is not counted. The count is therefore "distinct identifiers seen
//! since roughly the last cycle", not an exact sliding window.
//!
//! ## Stores
//!
//! - `InMemoryDedupStore`: sharded concurrent map for a single process
//! - `RedisDedupStore` (feature `redis-store`): shared across instances, using
//!   `SET NX PX` for the write path and `SCAN` for enumeration
//!
//! ## Observability
//!
//! All components log through `tracing`. Counters are available from
//! `RequestDedupService::metrics`:
//!
//! ```rust,no_run
//! # use request_dedup::RequestDedupService;
//! # let service = RequestDedupService::builder().with_background_aggregation(false).build().unwrap();
//! let snapshot = service.metrics().snapshot();
//! println!("Accepted: {}", snapshot.accepted);
//! println!("Duplicate rate: {:.2}%", snapshot.duplicate_rate() * 100.0);
//! println!("Cycles skipped: {}", snapshot.cycles_failed);
//! ```

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    identifier::{Identifier, ValidationError},
    outcome::Outcome,
    report::{AggregateReport, REPORT_LINE_PREFIX},
    window::{Window, WindowError, DEFAULT_KEY_PREFIX, DEFAULT_WINDOW, MAX_WINDOW},
};

pub use application::{
    aggregator::{
        AggregationCycleError, AggregatorConfig, AggregatorConfigError, AggregatorHandle,
        AggregatorState, PeriodicAggregator, ShutdownError, DEFAULT_TOPIC,
    },
    dispatcher::NotificationDispatcher,
    ingest::IngestService,
    metrics::{Metrics, MetricsSnapshot},
    ports::{
        Clock, DedupStore, NotifyError, Notifier, ReportLog, ReportLogError, SinkError,
        StoreError, StreamSink,
    },
    tracker::UniquenessTracker,
};

pub use infrastructure::{
    clock::SystemClock,
    http_notifier::{HttpNotifier, NotificationPayload, NOTIFICATION_MESSAGE},
    memory_store::InMemoryDedupStore,
    report_log::{FileReportLog, DEFAULT_REPORT_LOG_PATH},
    service::{BuildError, RequestDedupService, RequestDedupServiceBuilder},
    sink::{ChannelSink, StreamRecord},
};

#[cfg(feature = "redis-store")]
pub use infrastructure::{
    redis_store::{RedisDedupStore, RedisStoreConfig},
    redis_stream::RedisStreamSink,
};
