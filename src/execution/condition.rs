//! Selection predicates over `(key, value)` tuples.

use std::cmp::Ordering;
use std::fmt;

use crate::common::Key;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Comparator {
    /// Whether `lhs <op> rhs` holds, given `lhs.cmp(rhs)`.
    #[inline]
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::Ne => ordering != Ordering::Equal,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Le => ordering != Ordering::Greater,
            Comparator::Ge => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparator::Eq => "=",
            Comparator::Ne => "<>",
            Comparator::Lt => "<",
            Comparator::Gt => ">",
            Comparator::Le => "<=",
            Comparator::Ge => ">=",
        };
        f.write_str(op)
    }
}

/// A predicate on the key or the value column.
///
/// Values compare byte-wise, so `"B" < "a"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Key(Comparator, Key),
    Value(Comparator, String),
}

impl Condition {
    /// Whether the predicate reads the value column.
    #[inline]
    pub fn needs_value(&self) -> bool {
        matches!(self, Condition::Value(..))
    }

    /// Whether the predicate narrows an index range scan.
    ///
    /// `<>` on the key cannot be expressed as one interval.
    #[inline]
    pub fn bounds_key(&self) -> bool {
        matches!(self, Condition::Key(op, _) if *op != Comparator::Ne)
    }

    /// Evaluate against a tuple. `value` is ignored by key predicates.
    pub fn matches(&self, key: Key, value: &str) -> bool {
        match self {
            Condition::Key(op, operand) => op.accepts(key.cmp(operand)),
            Condition::Value(op, operand) => op.accepts(value.cmp(operand.as_str())),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Key(op, operand) => write!(f, "key {op} {operand}"),
            Condition::Value(op, operand) => write!(f, "value {op} '{operand}'"),
        }
    }
}
