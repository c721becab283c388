//! Internal telemetry for the aggregation purge engine.
//!
//! Structured logging through `tracing`, plus in-process counters describing
//! purge activity.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
