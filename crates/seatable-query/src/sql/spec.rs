//! Structured filter specification.
//!
//! These types mirror the JSON shape accepted by the service's view filter
//! settings: flat `filters` with one `filter_conjunction`, or
//! `filter_groups` joined by a `group_conjunction`, plus optional `sorts`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QueryError, QueryResult};

/// Keys allowed in a server-side row filter.
pub const ROW_FILTER_KEYS: [&str; 4] = [
    "column_name",
    "filter_predicate",
    "filter_term",
    "filter_term_modifier",
];

/// The default conjunction for clauses and groups.
pub const DEFAULT_CONJUNCTION: &str = "And";

fn default_conjunction() -> String {
    DEFAULT_CONJUNCTION.to_string()
}

/// A filter predicate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPredicate {
    Contains,
    DoesNotContain,
    Is,
    IsNot,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessOrEqual,
    GreaterOrEqual,
    IsEmpty,
    IsNotEmpty,
    IsWithin,
    IsBefore,
    IsAfter,
    IsOnOrBefore,
    IsOnOrAfter,
    HasAnyOf,
    HasAllOf,
    HasNoneOf,
    IsExactly,
    IsAnyOf,
    IsNoneOf,
}

impl FilterPredicate {
    /// Returns the wire name of the predicate.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPredicate::Contains => "contains",
            FilterPredicate::DoesNotContain => "does_not_contain",
            FilterPredicate::Is => "is",
            FilterPredicate::IsNot => "is_not",
            FilterPredicate::Equal => "equal",
            FilterPredicate::NotEqual => "not_equal",
            FilterPredicate::Less => "less",
            FilterPredicate::Greater => "greater",
            FilterPredicate::LessOrEqual => "less_or_equal",
            FilterPredicate::GreaterOrEqual => "greater_or_equal",
            FilterPredicate::IsEmpty => "is_empty",
            FilterPredicate::IsNotEmpty => "is_not_empty",
            FilterPredicate::IsWithin => "is_within",
            FilterPredicate::IsBefore => "is_before",
            FilterPredicate::IsAfter => "is_after",
            FilterPredicate::IsOnOrBefore => "is_on_or_before",
            FilterPredicate::IsOnOrAfter => "is_on_or_after",
            FilterPredicate::HasAnyOf => "has_any_of",
            FilterPredicate::HasAllOf => "has_all_of",
            FilterPredicate::HasNoneOf => "has_none_of",
            FilterPredicate::IsExactly => "is_exactly",
            FilterPredicate::IsAnyOf => "is_any_of",
            FilterPredicate::IsNoneOf => "is_none_of",
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic filter condition.
///
/// The column is looked up by `column_key` first, then by `column_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,

    pub filter_predicate: FilterPredicate,

    /// A scalar, a list of option names, or a day count for date modifiers.
    #[serde(default)]
    pub filter_term: Value,

    /// Relative date token for date columns. Empty means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_term_modifier: Option<String>,
}

impl FilterClause {
    /// Creates a clause addressing a column by name.
    pub fn by_name(
        column_name: impl Into<String>,
        filter_predicate: FilterPredicate,
        filter_term: impl Into<Value>,
    ) -> Self {
        Self {
            column_key: None,
            column_name: Some(column_name.into()),
            filter_predicate,
            filter_term: filter_term.into(),
            filter_term_modifier: None,
        }
    }

    /// Creates a clause addressing a column by key.
    pub fn by_key(
        column_key: impl Into<String>,
        filter_predicate: FilterPredicate,
        filter_term: impl Into<Value>,
    ) -> Self {
        Self {
            column_key: Some(column_key.into()),
            column_name: None,
            filter_predicate,
            filter_term: filter_term.into(),
            filter_term_modifier: None,
        }
    }

    /// Sets the relative date modifier.
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.filter_term_modifier = Some(modifier.into());
        self
    }

    /// Returns the modifier, treating an empty string as absent.
    pub fn modifier(&self) -> Option<&str> {
        self.filter_term_modifier
            .as_deref()
            .filter(|m| !m.trim().is_empty())
    }
}

/// Clauses joined by one conjunction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterGroup {
    #[serde(default)]
    pub filters: Vec<FilterClause>,

    #[serde(default = "default_conjunction")]
    pub filter_conjunction: String,
}

impl FilterGroup {
    /// Creates a group with the given conjunction (`And` or `Or`).
    pub fn new(filters: Vec<FilterClause>, filter_conjunction: impl Into<String>) -> Self {
        Self {
            filters,
            filter_conjunction: filter_conjunction.into(),
        }
    }
}

/// Sort direction of an `ORDER BY` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,

    /// `up` sorts ascending; anything else, including absence, descending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_type: Option<String>,
}

impl SortClause {
    /// Creates a sort on a column name.
    pub fn by_name(column_name: impl Into<String>, sort_type: Option<&str>) -> Self {
        Self {
            column_key: None,
            column_name: Some(column_name.into()),
            sort_type: sort_type.map(str::to_string),
        }
    }

    /// Returns the sort direction.
    pub fn direction(&self) -> SortDirection {
        match self.sort_type.as_deref() {
            Some("up") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// A complete filter specification.
///
/// Flat `filters` and `filter_groups` are mutually exclusive. When
/// `filter_groups` is present the grouped form is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpecification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterClause>,

    #[serde(default = "default_conjunction")]
    pub filter_conjunction: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_groups: Option<Vec<FilterGroup>>,

    #[serde(default = "default_conjunction")]
    pub group_conjunction: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<SortClause>,
}

impl Default for FilterSpecification {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            filter_conjunction: default_conjunction(),
            filter_groups: None,
            group_conjunction: default_conjunction(),
            sorts: Vec::new(),
        }
    }
}

impl FilterSpecification {
    /// Creates a flat specification.
    pub fn flat(filters: Vec<FilterClause>, filter_conjunction: impl Into<String>) -> Self {
        Self {
            filters,
            filter_conjunction: filter_conjunction.into(),
            ..Self::default()
        }
    }

    /// Creates a grouped specification.
    pub fn grouped(groups: Vec<FilterGroup>, group_conjunction: impl Into<String>) -> Self {
        Self {
            filter_groups: Some(groups),
            group_conjunction: group_conjunction.into(),
            ..Self::default()
        }
    }

    /// Appends sort keys.
    pub fn with_sorts(mut self, sorts: Vec<SortClause>) -> Self {
        self.sorts = sorts;
        self
    }

    /// Deserializes a specification from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidSpecification` for an unknown predicate,
    /// an unknown key, a missing `filter_predicate` or a wrongly shaped
    /// field.
    pub fn from_value(value: Value) -> QueryResult<Self> {
        let spec: Self = serde_json::from_value(value)
            .map_err(|e| QueryError::invalid_specification(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Deserializes a specification from JSON text.
    ///
    /// # Errors
    ///
    /// See [`FilterSpecification::from_value`].
    pub fn from_json(json: &str) -> QueryResult<Self> {
        let spec: Self = serde_json::from_str(json)
            .map_err(|e| QueryError::invalid_specification(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Returns true when the grouped form applies.
    pub fn is_grouped(&self) -> bool {
        self.filter_groups.is_some()
    }

    /// Checks the structural rules serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidSpecification` when both `filters` and
    /// `filter_groups` are supplied, or a conjunction is not `And`/`Or`.
    pub fn validate(&self) -> QueryResult<()> {
        if !self.filters.is_empty() && self.filter_groups.is_some() {
            return Err(QueryError::invalid_specification(
                "filters and filter_groups cannot be used together",
            ));
        }
        check_conjunction(&self.filter_conjunction)?;
        check_conjunction(&self.group_conjunction)?;
        for group in self.filter_groups.iter().flatten() {
            check_conjunction(&group.filter_conjunction)?;
        }
        Ok(())
    }
}

fn check_conjunction(conjunction: &str) -> QueryResult<()> {
    if conjunction.eq_ignore_ascii_case("and") || conjunction.eq_ignore_ascii_case("or") {
        Ok(())
    } else {
        Err(QueryError::invalid_specification(format!(
            "conjunction must be 'And' or 'Or', got '{conjunction}'"
        )))
    }
}

/// Validates server-side row filters before they are submitted.
///
/// # Errors
///
/// Returns `QueryError::InvalidSpecification` when `filters` is not a
/// non-empty list of objects, an object carries a key outside
/// [`ROW_FILTER_KEYS`], or `filter_conjunction` is not exactly `And` or `Or`.
pub fn validate_row_filters(filters: &Value, filter_conjunction: &str) -> QueryResult<()> {
    let list = filters
        .as_array()
        .ok_or_else(|| QueryError::invalid_specification("filters must be a list"))?;
    if list.is_empty() {
        return Err(QueryError::invalid_specification("filters can not be empty"));
    }
    for filter in list {
        let object = filter
            .as_object()
            .ok_or_else(|| QueryError::invalid_specification("each filter must be an object"))?;
        if let Some(key) = object.keys().find(|k| !ROW_FILTER_KEYS.contains(&k.as_str())) {
            return Err(QueryError::invalid_specification(format!(
                "unknown filter key '{key}'"
            )));
        }
    }
    if !matches!(filter_conjunction, "And" | "Or") {
        return Err(QueryError::invalid_specification(
            "filter_conjunction must be 'And' or 'Or'",
        ));
    }
    Ok(())
}
