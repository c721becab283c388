//! Table collaborator interface for aggregation purging.
//!
//! Aggregation tables are owned by the query engine; the purge core only
//! needs to describe a delete condition, have the table compile it, and
//! execute it with a batch of parameter records.

pub mod condition;
pub mod error;
pub mod event;
pub mod expression;
pub mod memory;
pub mod schema;
pub mod table;

pub use condition::*;
pub use error::TableError;
pub use event::*;
pub use expression::*;
pub use memory::MemoryTable;
pub use schema::*;
pub use table::*;
