//! Condition expressions handed to tables for compilation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Reference to an attribute, optionally qualified by the stream or table
/// that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable {
    pub stream_id: Option<String>,
    pub attribute: String,
}

impl Variable {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            stream_id: None,
            attribute: attribute.into(),
        }
    }

    pub fn of(stream_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            stream_id: Some(stream_id.into()),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stream_id {
            Some(stream) => write!(f, "{}.{}", stream, self.attribute),
            None => f.write_str(&self.attribute),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::Equal => "=",
            Self::NotEqual => "!=",
        }
    }

    /// Whether `lhs op rhs` holds given `lhs.cmp(rhs)`.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => ordering == Ordering::Less,
            Self::LessThanEqual => ordering != Ordering::Greater,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::GreaterThanEqual => ordering != Ordering::Less,
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
        }
    }

    /// Operator with its operands swapped: `a < b` is `b > a`.
    pub fn flipped(&self) -> Self {
        match self {
            Self::LessThan => Self::GreaterThan,
            Self::LessThanEqual => Self::GreaterThanEqual,
            Self::GreaterThan => Self::LessThan,
            Self::GreaterThanEqual => Self::LessThanEqual,
            Self::Equal => Self::Equal,
            Self::NotEqual => Self::NotEqual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    Variable(Variable),
    Compare {
        left: Box<Expression>,
        op: CompareOp,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn compare(left: Expression, op: CompareOp, right: Expression) -> Self {
        Self::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(v) => write!(f, "{}", v),
            Self::Compare { left, op, right } => write!(f, "{} {} {}", left, op.symbol(), right),
        }
    }
}
