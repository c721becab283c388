//! Core types for purging incremental aggregation tables.
//!
//! Covers granularities, duration literals, aggregation definitions, and the
//! resolution of per-granularity retention from defaults and purge blocks.

pub mod definition;
pub mod duration;
pub mod error;
pub mod granularity;
pub mod retention;

pub use definition::*;
pub use error::{Error, Result};
pub use granularity::*;
pub use retention::*;
