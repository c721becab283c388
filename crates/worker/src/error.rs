//! Tick-time purge errors.

use aggregation_core::Granularity;
use aggregation_table::TableError;
use thiserror::Error;

/// Failure to compile or execute the delete for one aggregation table.
///
/// Raised by a purge tick; the remaining granularities of that tick are not
/// processed.
#[derive(Debug, Error)]
#[error("failed to purge {granularity} table {table} older than {cutoff}: {source}")]
pub struct PurgeError {
    pub table: String,
    pub granularity: Granularity,
    pub cutoff: i64,
    #[source]
    pub source: TableError,
}
