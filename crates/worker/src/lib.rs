//! Background purging for incremental aggregations.
//!
//! - Predicate (delete condition for one aggregation table)
//! - Purge (one tick across every granularity of an aggregation)
//! - Scheduler (the recurring timer driving purge ticks)

pub mod error;
pub mod predicate;
pub mod purge;
pub mod scheduler;

pub use error::PurgeError;
pub use predicate::DeletionPredicateBuilder;
pub use purge::*;
pub use scheduler::PurgeScheduler;
