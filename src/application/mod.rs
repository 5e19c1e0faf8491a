//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Uniqueness tracker (write-path decisions)
//! - Notification dispatcher (fire-and-forget callbacks)
//! - Ingest service (per-request entry point)
//! - Periodic aggregator (count, report and clear each window)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from Redis, HTTP and the filesystem.

pub mod aggregator;
pub mod dispatcher;
pub mod ingest;
pub mod metrics;
pub mod ports;
pub mod tracker;
