//! Aggregation granularities and the mapping type keyed by them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Time bucket size at which an aggregation stores its results.
///
/// Variants are declared in ascending duration order, so the derived `Ord`
/// matches the natural ordering of the buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl Granularity {
    /// All granularities, shortest first.
    pub const ALL: [Granularity; 6] = [
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::Days,
        Self::Months,
        Self::Years,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    /// Accepts the singular, plural, and short spellings, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sec" | "second" | "seconds" => Ok(Self::Seconds),
            "min" | "minute" | "minutes" => Ok(Self::Minutes),
            "hour" | "hours" => Ok(Self::Hours),
            "day" | "days" => Ok(Self::Days),
            "month" | "months" => Ok(Self::Months),
            "year" | "years" => Ok(Self::Years),
            _ => Err(Error::unknown_granularity(s)),
        }
    }
}

/// Mapping keyed by the closed set of granularities.
///
/// Backed by one slot per variant; iteration always runs shortest
/// granularity first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranularityMap<T> {
    slots: [Option<T>; 6],
}

impl<T> Default for GranularityMap<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None, None, None],
        }
    }
}

impl<T> GranularityMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one for that granularity.
    pub fn insert(&mut self, granularity: Granularity, value: T) -> Option<T> {
        self.slots[granularity.index()].replace(value)
    }

    pub fn get(&self, granularity: Granularity) -> Option<&T> {
        self.slots[granularity.index()].as_ref()
    }

    pub fn contains(&self, granularity: Granularity) -> bool {
        self.slots[granularity.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Granularities present in the map, shortest first.
    pub fn granularities(&self) -> impl Iterator<Item = Granularity> + '_ {
        self.iter().map(|(g, _)| g)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Granularity, &T)> + '_ {
        Granularity::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(g, slot)| slot.as_ref().map(|v| (*g, v)))
    }
}

impl<T> FromIterator<(Granularity, T)> for GranularityMap<T> {
    fn from_iter<I: IntoIterator<Item = (Granularity, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (g, v) in iter {
            map.insert(g, v);
        }
        map
    }
}
