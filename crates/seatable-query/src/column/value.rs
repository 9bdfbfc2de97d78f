//! Comparison semantics between condition values and table cells.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use super::{ColumnKind, ValueFamily};
use crate::error::{QueryError, QueryResult};

const NUMBER_FORMAT: &str = "\"\" or digital numbers";
const DATE_FORMAT: &str =
    "\"YYYY-MM-DD\", \"YYYY-MM-DD hh\", \"YYYY-MM-DD hh:mm\" or \"YYYY-MM-DD hh:mm:ss\"";
const CHECKBOX_FORMAT: &str = "\"true\" or \"false\", case insensitive";

/// A comparison operator of the condition grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    Unequal,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Like,
}

impl CompareOp {
    /// Returns the operator as written in a condition.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::Unequal => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterEqual => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessEqual => "<=",
            CompareOp::Like => "like",
        }
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompareOp::GreaterThan | CompareOp::GreaterEqual | CompareOp::LessThan | CompareOp::LessEqual
        )
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl ValueFamily {
    /// Returns true if the family defines the operator.
    pub fn supports(&self, op: CompareOp) -> bool {
        match self {
            ValueFamily::Text => matches!(op, CompareOp::Equal | CompareOp::Unequal | CompareOp::Like),
            ValueFamily::Ordered => op != CompareOp::Like,
            ValueFamily::List | ValueFamily::Bool => {
                matches!(op, CompareOp::Equal | CompareOp::Unequal)
            }
        }
    }
}

/// A condition value coerced to a column's native type.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// The empty string: matches blank cells.
    Blank,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl InputValue {
    /// Coerces a raw condition value according to the column type.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::ValueCoercion` when a number, date or checkbox
    /// column receives a value in the wrong format.
    pub fn parse(kind: ColumnKind, raw: &str) -> QueryResult<Self> {
        match kind {
            ColumnKind::Number | ColumnKind::Rate | ColumnKind::Duration => parse_number(kind, raw),
            ColumnKind::Date | ColumnKind::Ctime | ColumnKind::Mtime => {
                if raw.is_empty() {
                    return Ok(InputValue::Blank);
                }
                parse_datetime(raw)
                    .map(InputValue::DateTime)
                    .ok_or_else(|| QueryError::value_coercion(kind, raw, DATE_FORMAT))
            }
            ColumnKind::Checkbox => parse_checkbox(kind, raw),
            _ if raw.is_empty() => Ok(InputValue::Blank),
            _ => Ok(InputValue::Text(raw.to_string())),
        }
    }
}

fn parse_number(kind: ColumnKind, raw: &str) -> QueryResult<InputValue> {
    if raw.is_empty() {
        return Ok(InputValue::Blank);
    }
    let parsed = if raw.contains('.') {
        raw.parse::<f64>().ok()
    } else {
        raw.parse::<i64>().ok().map(|n| n as f64)
    };
    parsed
        .map(InputValue::Number)
        .ok_or_else(|| QueryError::value_coercion(kind, raw, NUMBER_FORMAT))
}

fn parse_checkbox(kind: ColumnKind, raw: &str) -> QueryResult<InputValue> {
    if raw.is_empty() {
        return Ok(InputValue::Bool(false));
    }
    match raw.to_lowercase().as_str() {
        "true" => Ok(InputValue::Bool(true)),
        "false" => Ok(InputValue::Bool(false)),
        _ => Err(QueryError::value_coercion(kind, raw, CHECKBOX_FORMAT)),
    }
}

/// Parses `YYYY-MM-DD[ HH[:MM[:SS]]]`.
pub(crate) fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let parts: Vec<&str> = raw.split(' ').collect();
    match parts.as_slice() {
        [ymd] => NaiveDate::parse_from_str(ymd, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        [ymd, hms] => {
            let date = NaiveDate::parse_from_str(ymd, "%Y-%m-%d").ok()?;
            let fields = hms
                .split(':')
                .map(|f| f.parse::<u32>().ok())
                .collect::<Option<Vec<u32>>>()?;
            let (h, m, s) = match fields.as_slice() {
                [h] => (*h, 0, 0),
                [h, m] => (*h, *m, 0),
                [h, m, s] => (*h, *m, *s),
                _ => return None,
            };
            NaiveTime::from_hms_opt(h, m, s).map(|t| date.and_time(t))
        }
        _ => None,
    }
}

/// Parses a service timestamp (UTC, RFC 3339) into local time.
fn parse_system_time(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local).naive_local())
        .or_else(|| parse_datetime(raw))
}

/// A table cell viewed through its column type.
#[derive(Debug, Clone, Copy)]
pub struct CellValue<'a> {
    kind: ColumnKind,
    raw: Option<&'a Value>,
}

#[derive(Debug, PartialEq)]
enum Ordered {
    Blank,
    Number(f64),
    DateTime(NaiveDateTime),
}

impl<'a> CellValue<'a> {
    /// Wraps a raw cell. A missing key is treated like `null`.
    pub fn new(kind: ColumnKind, raw: Option<&'a Value>) -> Self {
        Self { kind, raw }
    }

    /// Returns true if the cell is null, the empty string, or an empty list.
    ///
    /// Zero is a real value and never blank.
    pub fn is_blank(&self) -> bool {
        match self.raw {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        }
    }

    /// Evaluates `cell <op> input`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnsupportedComparison` if the column type does not
    /// define the operator, `QueryError::AmbiguousComparison` for an ordering
    /// against the blank string, and `QueryError::InvalidLikePattern` for a
    /// `like` pattern without wildcards.
    pub fn compare(&self, op: CompareOp, input: &InputValue) -> QueryResult<bool> {
        let family = self.kind.value_family();
        if !family.supports(op) {
            return Err(QueryError::unsupported_comparison(self.kind, op.symbol()));
        }

        match family {
            ValueFamily::Text => self.compare_text(op, input),
            ValueFamily::Ordered => self.compare_ordered(op, input),
            ValueFamily::List => Ok(self.list_equal(input) == (op == CompareOp::Equal)),
            ValueFamily::Bool => {
                let expected = matches!(input, InputValue::Bool(true));
                Ok((self.truthy() == expected) == (op == CompareOp::Equal))
            }
        }
    }

    fn text(&self) -> Option<Cow<'a, str>> {
        match self.raw? {
            Value::String(s) if self.kind == ColumnKind::LongText => {
                Some(Cow::Borrowed(s.trim_matches('\n')))
            }
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Object(map) if self.kind == ColumnKind::LongText => map
                .get("text")
                .and_then(Value::as_str)
                .map(|s| Cow::Borrowed(s.trim_matches('\n'))),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    fn compare_text(&self, op: CompareOp, input: &InputValue) -> QueryResult<bool> {
        let matched = match (op, input) {
            (CompareOp::Like, InputValue::Text(pattern)) => {
                let text = self.text().unwrap_or_default();
                return like(&text, pattern);
            }
            (CompareOp::Like, _) => {
                return Err(QueryError::InvalidLikePattern {
                    pattern: String::new(),
                });
            }
            (_, InputValue::Blank) => self.is_blank(),
            (_, InputValue::Text(expected)) => self.text().is_some_and(|t| t == expected.as_str()),
            (_, _) => false,
        };
        Ok(matched == (op == CompareOp::Equal))
    }

    fn ordered(&self) -> QueryResult<Ordered> {
        if self.is_blank() {
            return Ok(Ordered::Blank);
        }
        let Some(raw) = self.raw else {
            return Ok(Ordered::Blank);
        };
        if matches!(self.kind, ColumnKind::Date | ColumnKind::Ctime | ColumnKind::Mtime) {
            let text = raw.as_str().unwrap_or_default();
            let parsed = if self.kind.is_system_time() {
                parse_system_time(text)
            } else {
                parse_datetime(text)
            };
            return parsed
                .map(Ordered::DateTime)
                .ok_or_else(|| QueryError::value_coercion(self.kind, text, DATE_FORMAT));
        }
        match raw {
            Value::Number(n) => Ok(n.as_f64().map_or(Ordered::Blank, Ordered::Number)),
            Value::String(s) => s
                .parse::<f64>()
                .map(Ordered::Number)
                .map_err(|_| QueryError::value_coercion(self.kind, s.as_str(), NUMBER_FORMAT)),
            other => Err(QueryError::value_coercion(self.kind, other.to_string(), NUMBER_FORMAT)),
        }
    }

    fn compare_ordered(&self, op: CompareOp, input: &InputValue) -> QueryResult<bool> {
        if op.is_ordering() && *input == InputValue::Blank {
            return Err(QueryError::AmbiguousComparison {
                operator: op.symbol().to_string(),
            });
        }

        let cell = self.ordered()?;
        let ordering = match (&cell, input) {
            (Ordered::Blank, InputValue::Blank) => Some(Ordering::Equal),
            (Ordered::Number(a), InputValue::Number(b)) => a.partial_cmp(b),
            (Ordered::DateTime(a), InputValue::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        };

        Ok(match op {
            CompareOp::Equal => ordering == Some(Ordering::Equal),
            CompareOp::Unequal => ordering != Some(Ordering::Equal),
            _ if cell == Ordered::Blank => false,
            CompareOp::GreaterThan => ordering == Some(Ordering::Greater),
            CompareOp::GreaterEqual => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            CompareOp::LessThan => ordering == Some(Ordering::Less),
            CompareOp::LessEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Like => false,
        })
    }

    fn list_equal(&self, input: &InputValue) -> bool {
        let InputValue::Text(expected) = input else {
            return self.is_blank();
        };
        let Some(Value::Array(items)) = self.raw else {
            return false;
        };
        items.iter().any(|item| match item {
            Value::String(s) => s == expected,
            Value::Object(map) => ["display_value", "row_id", "name"]
                .iter()
                .any(|field| map.get(*field).and_then(Value::as_str) == Some(expected.as_str())),
            _ => false,
        })
    }

    fn truthy(&self) -> bool {
        match self.raw {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
        }
    }
}

/// Matches `text` against a `%` wildcard pattern.
///
/// Four shapes: `abc%` prefix, `%abc` suffix, `%abc%` substring and `a%b`
/// prefix-and-suffix (split at the first and last `%`).
fn like(text: &str, pattern: &str) -> QueryResult<bool> {
    if !pattern.contains('%') {
        return Err(QueryError::InvalidLikePattern {
            pattern: pattern.to_string(),
        });
    }

    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%') && pattern.len() > 1;
    let matched = match (leading, trailing) {
        (false, true) => text.starts_with(&pattern[..pattern.len() - 1]),
        (true, false) if pattern.len() > 1 => text.ends_with(&pattern[1..]),
        (true, _) => {
            let middle = pattern
                .strip_prefix('%')
                .and_then(|p| p.strip_suffix('%'))
                .unwrap_or_default();
            text.contains(middle)
        }
        (false, false) => {
            let (start, rest) = pattern.split_once('%').unwrap_or((pattern, ""));
            let end = rest.rsplit_once('%').map_or(rest, |(_, end)| end);
            text.starts_with(start) && text.ends_with(end)
        }
    };
    Ok(matched)
}
