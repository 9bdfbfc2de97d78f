//! Abstract Syntax Tree (AST) for textual conditions.

use crate::column::CompareOp;

/// A single `column op value` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Column name (left factor).
    pub column: String,
    /// Comparison operator.
    pub op: CompareOp,
    /// Raw value (right factor), coerced per column type at evaluation.
    pub value: String,
}

/// A parsed condition expression.
///
/// `AND` and `OR` share one precedence level and fold left to right, so
/// `a AND b OR c` is `(a AND b) OR c` and `a OR b AND c` is `(a OR b) AND c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Leaf comparison.
    Filter(Comparison),

    /// Rows matched by both sides, in left-side order.
    And(Box<Condition>, Box<Condition>),

    /// Rows matched by either side: left-side rows first, then new right-side rows.
    Or(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Creates a leaf comparison.
    pub fn filter(column: impl Into<String>, op: CompareOp, value: impl Into<String>) -> Self {
        Condition::Filter(Comparison {
            column: column.into(),
            op,
            value: value.into(),
        })
    }

    /// Creates an AND merge of two conditions.
    pub fn and(left: Condition, right: Condition) -> Self {
        Condition::And(Box::new(left), Box::new(right))
    }

    /// Creates an OR merge of two conditions.
    pub fn or(left: Condition, right: Condition) -> Self {
        Condition::Or(Box::new(left), Box::new(right))
    }
}
