//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Dedup stores (in-memory sharded map, Redis)
//! - Stream sinks (Redis Streams, in-process channel)
//! - The durable report log and the HTTP notifier
//! - The assembled service and its builder

pub mod clock;
pub mod http_notifier;
pub mod memory_store;
pub mod report_log;
pub mod service;
pub mod sink;

#[cfg(feature = "redis-store")]
pub mod redis_store;

#[cfg(feature = "redis-store")]
pub mod redis_stream;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides controllable test doubles for every
/// port.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// request-dedup = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
