//! Assembles a full query from a filter specification.

use chrono::NaiveDate;
use tracing::debug;

use super::operator::Operator;
use super::spec::{FilterClause, FilterSpecification, SortClause};
use crate::column::Column;
use crate::date::DateResolver;
use crate::error::QueryResult;

/// Sort keys that exist on every table without column metadata.
const VIRTUAL_SORT_COLUMNS: [&str; 2] = ["_ctime", "_mtime"];

/// Compiles filter specifications against one table's columns.
///
/// Compilation is deterministic: clauses, groups and sorts are emitted in
/// input order.
///
/// # Example
///
/// ```
/// use seatable_query::column::{Column, ColumnKind};
/// use seatable_query::sql::{FilterClause, FilterPredicate, FilterSpecification, SqlGenerator};
///
/// let columns = vec![Column::new("0000", "Name", ColumnKind::Text)];
/// let spec = FilterSpecification::flat(
///     vec![FilterClause::by_name("Name", FilterPredicate::Is, "LINK")],
///     "And",
/// );
/// let sql = SqlGenerator::new("Table1", &columns).to_sql(&spec, 0, 500).unwrap();
/// assert_eq!(sql, "SELECT * FROM Table1 WHERE Name = 'LINK' LIMIT 0, 500");
/// ```
#[derive(Debug)]
pub struct SqlGenerator<'a> {
    table_name: &'a str,
    columns: &'a [Column],
    resolver: DateResolver,
}

impl<'a> SqlGenerator<'a> {
    /// Creates a generator resolving relative dates against the local date.
    pub fn new(table_name: &'a str, columns: &'a [Column]) -> Self {
        Self {
            table_name,
            columns,
            resolver: DateResolver::default(),
        }
    }

    /// Pins the day relative date modifiers resolve against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.resolver = DateResolver::new(today);
        self
    }

    /// Compiles `spec` into a `SELECT` statement.
    ///
    /// Clauses whose column cannot be found by key or name are skipped.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidSpecification` for a malformed
    /// specification, and the operator errors of the first clause that
    /// fails to compile.
    pub fn to_sql(
        &self,
        spec: &FilterSpecification,
        start: usize,
        limit: usize,
    ) -> QueryResult<String> {
        spec.validate()?;

        let mut sql = format!("SELECT * FROM {}", self.table_name);
        if let Some(condition) = self.where_clause(spec)? {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }
        if let Some(order) = self.order_by(&spec.sorts) {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        sql.push_str(&format!(" LIMIT {start}, {limit}"));

        debug!(table = self.table_name, %sql, "compiled filter specification");
        Ok(sql)
    }

    fn where_clause(&self, spec: &FilterSpecification) -> QueryResult<Option<String>> {
        let Some(groups) = &spec.filter_groups else {
            let fragments = self.compile_clauses(&spec.filters)?;
            if fragments.is_empty() {
                return Ok(None);
            }
            return Ok(Some(fragments.join(&format!(" {} ", spec.filter_conjunction))));
        };

        let mut compiled = Vec::with_capacity(groups.len());
        for group in groups {
            let fragments = self.compile_clauses(&group.filters)?;
            if !fragments.is_empty() {
                compiled.push(format!(
                    "({})",
                    fragments.join(&format!(" {} ", group.filter_conjunction))
                ));
            }
        }
        if compiled.is_empty() {
            return Ok(None);
        }
        Ok(Some(compiled.join(&format!(" {} ", spec.group_conjunction))))
    }

    fn compile_clauses(&self, clauses: &[FilterClause]) -> QueryResult<Vec<String>> {
        let mut fragments = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let Some(column) =
                self.find_column(clause.column_key.as_deref(), clause.column_name.as_deref())
            else {
                debug!(
                    column_key = clause.column_key.as_deref().unwrap_or_default(),
                    column_name = clause.column_name.as_deref().unwrap_or_default(),
                    "skipping filter on unknown column"
                );
                continue;
            };
            fragments.push(Operator::new(column, self.resolver)?.compile(clause)?);
        }
        Ok(fragments)
    }

    fn order_by(&self, sorts: &[SortClause]) -> Option<String> {
        let terms: Vec<String> = sorts
            .iter()
            .filter_map(|sort| {
                let key = sort.column_key.as_deref();
                let name = sort.column_name.as_deref();
                let column = match self.find_column(key, name) {
                    Some(column) => column.name.as_str(),
                    None => [key, name]
                        .into_iter()
                        .flatten()
                        .find(|c| VIRTUAL_SORT_COLUMNS.contains(c))?,
                };
                Some(format!("{column} {}", sort.direction()))
            })
            .collect();

        if terms.is_empty() {
            None
        } else {
            Some(terms.join(", "))
        }
    }

    fn find_column(&self, key: Option<&str>, name: Option<&str>) -> Option<&'a Column> {
        let by_key = key
            .filter(|k| !k.is_empty())
            .and_then(|k| self.columns.iter().find(|c| c.key == k));
        by_key.or_else(|| {
            name.filter(|n| !n.is_empty())
                .and_then(|n| self.columns.iter().find(|c| c.name == n))
        })
    }
}
