//! Mock implementations for testing.
//!
//! Test doubles for every port, so the tracker, dispatcher and aggregator can
//! be exercised without Redis, a stream broker, a filesystem or a network.

pub mod clock;
pub mod layer;
pub mod notifier;
pub mod sink;
pub mod store;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
pub use notifier::MockNotifier;
pub use sink::{MemoryReportLog, RecordingSink};
pub use store::FailingStore;
