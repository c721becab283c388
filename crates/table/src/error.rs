//! Errors raised by table collaborators.

use thiserror::Error;

use crate::schema::AttributeType;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("unknown attribute {attribute} referenced in {query}")]
    UnknownAttribute { query: String, attribute: String },

    #[error("unsupported condition in {query}: {reason}")]
    UnsupportedCondition { query: String, reason: String },

    #[error("column {column} in {query} is {actual}, but its parameter is {expected}")]
    TypeMismatch {
        query: String,
        column: String,
        expected: AttributeType,
        actual: AttributeType,
    },

    #[error("condition was not compiled by table {table}")]
    ForeignCondition { table: String },

    #[error("parameter record has no value at position {position}")]
    MissingParameter { position: usize },

    #[error("row for table {table} has {actual} values, expected {expected}")]
    ArityMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("storage error on table {table}: {source}")]
    Storage {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TableError {
    pub fn unsupported(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedCondition {
            query: query.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(
        table: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            table: table.into(),
            source: source.into(),
        }
    }
}
