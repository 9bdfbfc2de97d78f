//! Structured filter to SQL compiler.
//!
//! Turns a [`FilterSpecification`] into one query string for the service's
//! SQL endpoint:
//!
//! ```text
//! SELECT * FROM <table> [WHERE <expr>] [ORDER BY <col> ASC|DESC, ...] LIMIT <start>, <limit>
//! ```
//!
//! Each column type binds to an operator that accepts a fixed set of
//! predicates (see [`OperatorKind::supported_predicates`]). Date predicates
//! resolve relative modifiers such as `number_of_days_ago` against a fixed
//! "today". Clauses naming a column that does not exist are skipped rather
//! than rejected.

mod generator;
mod operator;
mod spec;

pub use generator::SqlGenerator;
pub use operator::{Operator, OperatorKind};
pub use spec::{
    validate_row_filters, FilterClause, FilterGroup, FilterPredicate, FilterSpecification,
    SortClause, SortDirection, DEFAULT_CONJUNCTION, ROW_FILTER_KEYS,
};

use crate::error::QueryResult;
use crate::source::DataSource;

/// Default first row offset.
pub const DEFAULT_START: usize = 0;

/// Default page size.
pub const DEFAULT_LIMIT: usize = 500;

/// Fetches the columns of `table_name` and compiles `spec` against them.
///
/// # Errors
///
/// Returns the data source's error if the columns cannot be listed, and any
/// compilation error from [`SqlGenerator::to_sql`].
pub fn filter_to_sql<S>(
    source: &S,
    table_name: &str,
    spec: &FilterSpecification,
    start: usize,
    limit: usize,
) -> QueryResult<String>
where
    S: DataSource + ?Sized,
{
    let columns = source.list_columns(table_name, None)?;
    SqlGenerator::new(table_name, &columns).to_sql(spec, start, limit)
}
