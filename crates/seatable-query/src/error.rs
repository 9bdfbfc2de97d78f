//! Error types for the query engine.

use thiserror::Error;

use crate::column::ColumnKind;
use crate::condition::SyntaxError;
use crate::sql::FilterPredicate;

/// A specialized Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised by the condition engine and the filter-to-SQL compiler.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    /// The textual condition does not match the grammar.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A condition references a column missing from the table metadata.
    #[error("Column not found: {column}")]
    ColumnNotFound {
        /// The column name used in the condition.
        column: String,
    },

    /// The filter predicate is not defined for the column's type.
    #[error(
        "{column_type} type column does not support '{predicate}', available predicates are [{}]",
        format_predicates(supported)
    )]
    UnsupportedPredicate {
        /// Declared type of the column.
        column_type: ColumnKind,
        /// The rejected predicate.
        predicate: FilterPredicate,
        /// Predicates the column type accepts.
        supported: Vec<FilterPredicate>,
    },

    /// The column type cannot be compiled into a query at all.
    #[error("{column_type} type column does not support transferring filter to sql")]
    UnsupportedColumnType {
        /// Declared type of the column.
        column_type: ColumnKind,
    },

    /// A comparison operator is not defined for the column's value family.
    #[error("{column_type} type column does not support the query method '{operator}'")]
    UnsupportedComparison {
        /// Declared type of the column.
        column_type: ColumnKind,
        /// The operator as written in the condition.
        operator: String,
    },

    /// A `like` pattern without any `%` wildcard.
    #[error("there is no pattern found in like phrase \"{pattern}\"")]
    InvalidLikePattern {
        /// The pattern as written in the condition.
        pattern: String,
    },

    /// An input value cannot be coerced to the column's native type.
    #[error("{column_type} type column does not support the query string \"{value}\", expected {expected}")]
    ValueCoercion {
        /// Declared type of the column.
        column_type: ColumnKind,
        /// The offending input.
        value: String,
        /// Description of the accepted format.
        expected: &'static str,
    },

    /// An ordering comparison against the blank string.
    #[error("the operator \"{operator}\" does not support the null query string \"\"")]
    AmbiguousComparison {
        /// The ordering operator that was used.
        operator: String,
    },

    /// A date filter term or modifier cannot be resolved to a date.
    #[error("cannot resolve date filter term \"{term}\": {reason}")]
    InvalidDateTerm {
        /// The filter term as supplied.
        term: String,
        /// Why it could not be resolved.
        reason: String,
    },

    /// The filter specification has the wrong shape.
    #[error("invalid filter specification: {message}")]
    InvalidSpecification {
        /// Description of the structural problem.
        message: String,
    },

    /// The external row source reported a failure.
    #[error("data source error: {message}")]
    DataSource {
        /// Message reported by the source.
        message: String,
    },
}

impl QueryError {
    /// Creates a column not found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        QueryError::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Creates an unsupported comparison error.
    pub fn unsupported_comparison(column_type: ColumnKind, operator: impl Into<String>) -> Self {
        QueryError::UnsupportedComparison {
            column_type,
            operator: operator.into(),
        }
    }

    /// Creates a value coercion error.
    pub fn value_coercion(
        column_type: ColumnKind,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        QueryError::ValueCoercion {
            column_type,
            value: value.into(),
            expected,
        }
    }

    /// Creates an invalid date term error.
    pub fn invalid_date_term(term: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidDateTerm {
            term: term.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid specification error.
    pub fn invalid_specification(message: impl Into<String>) -> Self {
        QueryError::InvalidSpecification {
            message: message.into(),
        }
    }

    /// Creates a data source error.
    pub fn data_source(message: impl Into<String>) -> Self {
        QueryError::DataSource {
            message: message.into(),
        }
    }
}

fn format_predicates(predicates: &[FilterPredicate]) -> String {
    predicates
        .iter()
        .map(|p| format!("'{p}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
