//! Parameter records passed alongside a compiled condition.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl Value {
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Ordering between two values of compatible types.
    ///
    /// Integers and doubles compare numerically; strings and booleans only
    /// compare with their own kind. `Null` compares with nothing.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Double(a), b) => b.as_long().and_then(|b| a.partial_cmp(&(b as f64))),
            (a, Self::Double(b)) => a.as_long().and_then(|a| (a as f64).partial_cmp(b)),
            (a, b) => Some(a.as_long()?.cmp(&b.as_long()?)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// One row of parameter values, positioned as in the parameter definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterRecord {
    values: Vec<Value>,
}

impl ParameterRecord {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Batch of parameter records for one delete call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterBatch {
    records: Vec<ParameterRecord>,
}

impl ParameterBatch {
    /// Batch holding exactly one record.
    pub fn single(record: ParameterRecord) -> Self {
        Self {
            records: vec![record],
        }
    }

    pub fn records(&self) -> &[ParameterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
