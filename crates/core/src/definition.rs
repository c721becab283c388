//! Structured aggregation definitions as handed over by the definition parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::granularity::Granularity;

/// Raw `purge` block of an aggregation definition.
///
/// Values are kept as the literals the user wrote; they are validated when
/// the retention policy is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeAnnotation {
    /// `true` or `false`, any case.
    #[serde(default)]
    pub enable: Option<String>,
    /// Duration literal between purge runs.
    #[serde(default)]
    pub interval: Option<String>,
    /// Granularity name to duration literal or `all`.
    #[serde(default)]
    pub retention: BTreeMap<String, String>,
}

impl PurgeAnnotation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enable(mut self, enable: impl Into<String>) -> Self {
        self.enable = Some(enable.into());
        self
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn with_retention(
        mut self,
        granularity: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.retention.insert(granularity.into(), value.into());
        self
    }
}

/// An incremental aggregation: its id, the granularities it computes, and
/// its optional purge block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationDefinition {
    pub id: String,
    pub granularities: Vec<Granularity>,
    #[serde(default)]
    pub purge: Option<PurgeAnnotation>,
}

impl AggregationDefinition {
    pub fn new(id: impl Into<String>, granularities: impl IntoIterator<Item = Granularity>) -> Self {
        let mut granularities: Vec<_> = granularities.into_iter().collect();
        granularities.sort();
        granularities.dedup();
        Self {
            id: id.into(),
            granularities,
            purge: None,
        }
    }

    pub fn with_purge(mut self, purge: PurgeAnnotation) -> Self {
        self.purge = Some(purge);
        self
    }
}
