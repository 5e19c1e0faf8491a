//! Domain layer - pure types with no I/O.
//!
//! - Identifier parsing and validation
//! - The four-way ingestion outcome
//! - Window configuration
//! - Aggregate reports

pub mod identifier;
pub mod outcome;
pub mod report;
pub mod window;
