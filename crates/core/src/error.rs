//! Setup-time error types for aggregation purging.
//!
//! Every variant is raised while an aggregation is being constructed. None
//! of them can occur once a purge task is running.

use thiserror::Error;

use crate::granularity::Granularity;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error raised while resolving purge settings.
#[derive(Debug, Error)]
pub enum Error {
    #[error("undefined value for enable: {0}, please use true or false")]
    InvalidEnable(String),

    #[error(
        "{0} granularity cannot be purged since aggregation has not been performed in {0} granularity"
    )]
    GranularityNotAggregated(Granularity),

    #[error("unknown granularity: {0}")]
    UnknownGranularity(String),

    #[error("invalid duration literal: {0:?}")]
    InvalidDuration(String),

    #[error("{what} must be a positive duration, got {literal:?}")]
    NonPositiveDuration { what: String, literal: String },

    #[error("aggregation {0} does not maintain any granularity")]
    EmptyAggregation(String),

    #[error("aggregation {aggregation} has no table for {granularity} granularity")]
    MissingTable {
        aggregation: String,
        granularity: Granularity,
    },
}

impl Error {
    pub fn invalid_enable(value: impl Into<String>) -> Self {
        Self::InvalidEnable(value.into())
    }

    pub fn unknown_granularity(name: impl Into<String>) -> Self {
        Self::UnknownGranularity(name.into())
    }

    pub fn invalid_duration(literal: impl Into<String>) -> Self {
        Self::InvalidDuration(literal.into())
    }

    pub fn non_positive(what: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::NonPositiveDuration {
            what: what.into(),
            literal: literal.into(),
        }
    }
}
