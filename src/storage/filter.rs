//! Scan predicates.
//!
//! A [`Filter`] is a per-field predicate applied while scanning rows.
//! `Single` compares one cell against one value with any operator; `Range`
//! tests membership of a cell in a value set and is restricted to `=` /
//! `!=` by construction ([`RangeOp`] has no ordering variants).
//!
//! Comparison is typed: cells are decoded before comparing, so ordering
//! operators follow numeric order for ints and floats and lexicographic
//! order for strings. Values of mismatched primitives never compare; the
//! table validates filter/field type agreement before any row is read.

use std::cmp::Ordering;
use std::fmt;

use crate::types::{Primitive, Value};

/// Comparison operators accepted in a WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Operator {
    /// Parses an operator from its SQL spelling.
    pub fn parse(s: &str) -> Option<Operator> {
        match s {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::NotEq),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::LtEq),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::GtEq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtEq => "<=",
            Operator::Gt => ">",
            Operator::GtEq => ">=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::NotEq => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::LtEq => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::GtEq => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operators allowed on a value-set filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Eq,
    NotEq,
}

/// A per-field scan predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field OP value`.
    Single {
        field: String,
        op: Operator,
        value: Value,
    },
    /// `field = any-of values` / `field != all-of values`.
    Range {
        field: String,
        op: RangeOp,
        values: Vec<Value>,
    },
}

impl Filter {
    /// The field this filter applies to.
    pub fn field(&self) -> &str {
        match self {
            Filter::Single { field, .. } | Filter::Range { field, .. } => field,
        }
    }

    /// The primitive the filter compares against, when it carries one.
    /// An empty range has no primitive to validate.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Filter::Single { value, .. } => Some(value.primitive()),
            Filter::Range { values, .. } => values.first().map(Value::primitive),
        }
    }

    /// Evaluates the filter against one decoded cell.
    pub fn matches(&self, cell: &Value) -> bool {
        match self {
            Filter::Single { op, value, .. } => compare(cell, *op, value),
            Filter::Range { op, values, .. } => {
                let hit = values.iter().any(|v| compare(cell, Operator::Eq, v));
                match op {
                    RangeOp::Eq => hit,
                    RangeOp::NotEq => !hit,
                }
            }
        }
    }
}

/// Typed comparison of two cells. Mismatched primitives never hold; a NaN
/// float compares as unordered and fails every operator.
fn compare(lhs: &Value, op: Operator, rhs: &Value) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.is_some_and(|o| op.holds(o))
}
