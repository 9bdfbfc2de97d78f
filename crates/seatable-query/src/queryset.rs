//! Chainable result sets over one table.
//!
//! A [`QuerySet`] holds a table's columns and the rows matching a textual
//! condition. Its condition runs once, when the set is built; narrowing
//! with [`QuerySet::filter`] builds a new set from the current rows, so an
//! earlier set stays valid while a later one is in use.

use std::slice;

use tracing::debug;

use crate::column::Column;
use crate::condition::{ConditionEvaluator, ConditionParser};
use crate::error::QueryResult;
use crate::row::{Row, RowPatch};
use crate::source::DataSource;

/// Rows of one table matching a condition.
pub struct QuerySet<'s, S: DataSource + ?Sized> {
    source: &'s S,
    table_name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    conditions: String,
}

/// Loads a table from `source` and keeps the rows matching `conditions`.
///
/// An empty condition keeps every row.
///
/// # Errors
///
/// Returns the source's error if the table cannot be listed, and any syntax
/// or evaluation error raised by the condition.
///
/// # Example
///
/// ```
/// use seatable_query::column::{Column, ColumnKind};
/// use seatable_query::source::{MemorySource, Table};
/// use seatable_query::Row;
///
/// let source = MemorySource::new().with_table(Table::new(
///     "Table1",
///     vec![Column::new("0000", "Name", ColumnKind::Text)],
///     vec![Row::new("r1").with("Name", "Tom"), Row::new("r2").with("Name", "Ann")],
/// ));
///
/// let tom = seatable_query::filter(&source, "Table1", "Name = Tom", None).unwrap();
/// assert_eq!(tom.count(), 1);
/// ```
pub fn filter<'s, S>(
    source: &'s S,
    table_name: &str,
    conditions: &str,
    view_name: Option<&str>,
) -> QueryResult<QuerySet<'s, S>>
where
    S: DataSource + ?Sized,
{
    let rows = source.list_rows(table_name, view_name)?;
    let columns = source.list_columns(table_name, view_name)?;
    QuerySet::new(source, table_name, columns, rows, conditions)
}

impl<'s, S: DataSource + ?Sized> QuerySet<'s, S> {
    /// Builds a set from already fetched rows and columns.
    ///
    /// # Errors
    ///
    /// Returns any syntax or evaluation error raised by `conditions`.
    pub fn new(
        source: &'s S,
        table_name: impl Into<String>,
        columns: Vec<Column>,
        rows: Vec<Row>,
        conditions: &str,
    ) -> QueryResult<Self> {
        let table_name = table_name.into();
        let rows = execute_conditions(&columns, rows, conditions)?;
        debug!(table = %table_name, conditions, matched = rows.len(), "query set built");
        Ok(Self {
            source,
            table_name,
            columns,
            rows,
            conditions: conditions.to_string(),
        })
    }

    /// Returns a new set holding the current rows that match `conditions`.
    ///
    /// # Errors
    ///
    /// Returns any syntax or evaluation error raised by `conditions`.
    pub fn filter(&self, conditions: &str) -> QueryResult<Self> {
        Self::new(
            self.source,
            self.table_name.clone(),
            self.columns.clone(),
            self.rows.clone(),
            conditions,
        )
    }

    /// Returns the first current row matching `conditions`.
    ///
    /// # Errors
    ///
    /// Returns any syntax or evaluation error raised by `conditions`.
    pub fn get(&self, conditions: &str) -> QueryResult<Option<Row>> {
        Ok(self.filter(conditions)?.rows.into_iter().next())
    }

    /// Returns an independent copy of this set.
    pub fn all(&self) -> Self {
        Self {
            source: self.source,
            table_name: self.table_name.clone(),
            columns: self.columns.clone(),
            rows: self.rows.clone(),
            conditions: self.conditions.clone(),
        }
    }

    /// Returns the first row.
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Returns the last row.
    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Returns the number of rows.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the set holds any row.
    pub fn exists(&self) -> bool {
        !self.rows.is_empty()
    }

    /// Returns the number of rows; same as [`QuerySet::count`].
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when no row matched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows in table order.
    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns the current rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the table's columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the name of the table the rows came from.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the condition this set was built with.
    pub fn conditions(&self) -> &str {
        &self.conditions
    }

    /// Applies `patch` to every row, through the source and in memory.
    ///
    /// Returns the updated rows.
    ///
    /// # Errors
    ///
    /// Stops at the first row the source fails to update. Rows patched
    /// before the failure keep their new values.
    pub fn update(&mut self, patch: &RowPatch) -> QueryResult<Vec<Row>> {
        for row in &mut self.rows {
            self.source.update_row(&self.table_name, row.id(), patch)?;
            row.apply_patch(patch);
        }
        debug!(table = %self.table_name, updated = self.rows.len(), "query set updated");
        Ok(self.rows.clone())
    }

    /// Deletes every row through the source and empties the set.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns the source's error; the set is left unchanged in that case.
    pub fn delete(&mut self) -> QueryResult<usize> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let row_ids: Vec<String> = self.rows.iter().map(|r| r.id().to_string()).collect();
        self.source.batch_delete_rows(&self.table_name, &row_ids)?;
        self.rows.clear();
        debug!(table = %self.table_name, deleted = row_ids.len(), "query set deleted");
        Ok(row_ids.len())
    }
}

impl<S: DataSource + ?Sized> std::fmt::Debug for QuerySet<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("table_name", &self.table_name)
            .field("conditions", &self.conditions)
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl<'a, S: DataSource + ?Sized> IntoIterator for &'a QuerySet<'_, S> {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<S: DataSource + ?Sized> IntoIterator for QuerySet<'_, S> {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

fn execute_conditions(
    columns: &[Column],
    rows: Vec<Row>,
    conditions: &str,
) -> QueryResult<Vec<Row>> {
    if conditions.trim().is_empty() {
        return Ok(rows);
    }
    let condition = ConditionParser::parse(conditions)?;
    let matched = ConditionEvaluator::new(&condition, columns).filter_rows(&rows)?;
    Ok(matched.into_iter().cloned().collect())
}
