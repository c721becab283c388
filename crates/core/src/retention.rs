//! Retention policy definitions and resolution.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::time::Duration;

use crate::definition::{AggregationDefinition, PurgeAnnotation};
use crate::duration::{self, days, hours, minutes, seconds, years};
use crate::error::{Error, Result};
use crate::granularity::{Granularity, GranularityMap};

/// Time between purge runs when the purge block does not set one.
pub const DEFAULT_PURGE_INTERVAL_MS: u64 = minutes(15);

/// Retention literal that keeps every row of a granularity.
pub const RETAIN_ALL_LITERAL: &str = "all";

/// How long rows of one granularity are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionValue {
    /// Never purge this granularity.
    RetainAll,
    /// Rows older than this many milliseconds are purged.
    Millis(NonZeroU64),
}

impl RetentionValue {
    /// Built-in retention for a granularity.
    pub fn default_for(granularity: Granularity) -> Self {
        let millis = match granularity {
            Granularity::Seconds => seconds(30),
            Granularity::Minutes => hours(24),
            Granularity::Hours => days(30),
            Granularity::Days => years(5),
            Granularity::Months | Granularity::Years => return Self::RetainAll,
        };
        Self::from_millis(millis).unwrap_or(Self::RetainAll)
    }

    /// Returns `None` for zero, which is not a valid retention.
    pub fn from_millis(millis: u64) -> Option<Self> {
        NonZeroU64::new(millis).map(Self::Millis)
    }

    pub fn is_retain_all(&self) -> bool {
        matches!(self, Self::RetainAll)
    }

    /// Retention in milliseconds, `None` for retain-all.
    pub fn millis(&self) -> Option<u64> {
        match self {
            Self::RetainAll => None,
            Self::Millis(ms) => Some(ms.get()),
        }
    }

    /// Oldest timestamp that survives a purge at `now_millis`.
    ///
    /// Rows strictly older than the cutoff are eligible for deletion.
    pub fn cutoff(&self, now_millis: i64) -> Option<i64> {
        let retention = i64::try_from(self.millis()?).unwrap_or(i64::MAX);
        Some(now_millis.saturating_sub(retention))
    }
}

/// Effective retention per aggregated granularity.
///
/// Immutable once resolved; shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    periods: GranularityMap<RetentionValue>,
}

impl RetentionPolicy {
    /// Defaults for every given granularity.
    pub fn defaults(granularities: &[Granularity]) -> Self {
        Self {
            periods: granularities
                .iter()
                .map(|g| (*g, RetentionValue::default_for(*g)))
                .collect(),
        }
    }

    pub fn get(&self, granularity: Granularity) -> Option<RetentionValue> {
        self.periods.get(granularity).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Granularity, RetentionValue)> + '_ {
        self.periods.iter().map(|(g, v)| (g, *v))
    }

    pub fn granularities(&self) -> impl Iterator<Item = Granularity> + '_ {
        self.periods.granularities()
    }

    fn set(&mut self, granularity: Granularity, value: RetentionValue) {
        self.periods.insert(granularity, value);
    }
}

/// Whether purging runs and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_millis(DEFAULT_PURGE_INTERVAL_MS),
        }
    }
}

impl PurgeConfig {
    pub fn interval_millis(&self) -> u64 {
        u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Retention policy and purge configuration resolved from a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeSettings {
    pub policy: RetentionPolicy,
    pub config: PurgeConfig,
}

impl PurgeSettings {
    /// Resolves the effective purge settings of an aggregation.
    ///
    /// All validation happens here; an error means the aggregation must not
    /// start.
    pub fn resolve(definition: &AggregationDefinition) -> Result<Self> {
        if definition.granularities.is_empty() {
            return Err(Error::EmptyAggregation(definition.id.clone()));
        }

        let mut settings = Self {
            policy: RetentionPolicy::defaults(&definition.granularities),
            config: PurgeConfig::default(),
        };

        if let Some(purge) = &definition.purge {
            settings.apply(purge)?;
        }

        Ok(settings)
    }

    fn apply(&mut self, purge: &PurgeAnnotation) -> Result<()> {
        if let Some(enable) = &purge.enable {
            self.config.enabled = parse_enable(enable)?;
        }

        // A disabled purge block is inert; its other keys are not read.
        if !self.config.enabled {
            return Ok(());
        }

        if let Some(interval) = &purge.interval {
            let millis = duration::parse_millis(interval)?;
            if millis == 0 {
                return Err(Error::non_positive("purge interval", interval.as_str()));
            }
            self.config.interval = Duration::from_millis(millis);
        }

        for (name, value) in &purge.retention {
            let granularity: Granularity = name.parse()?;
            if self.policy.get(granularity).is_none() {
                return Err(Error::GranularityNotAggregated(granularity));
            }
            self.policy.set(granularity, parse_retention(granularity, value)?);
        }

        Ok(())
    }
}

fn parse_enable(value: &str) -> Result<bool> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::invalid_enable(value))
    }
}

fn parse_retention(granularity: Granularity, value: &str) -> Result<RetentionValue> {
    if value.trim().eq_ignore_ascii_case(RETAIN_ALL_LITERAL) {
        return Ok(RetentionValue::RetainAll);
    }
    let millis = duration::parse_millis(value)?;
    RetentionValue::from_millis(millis)
        .ok_or_else(|| Error::non_positive(format!("retention for {}", granularity), value))
}
