//! Row and column providers.
//!
//! The query engine never talks to the service itself. A [`DataSource`]
//! hands it rows and columns and applies the writes a [`QuerySet`] makes.
//! [`MemorySource`] keeps whole tables in memory and backs the tests and
//! the command-line tool.
//!
//! [`QuerySet`]: crate::queryset::QuerySet

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::Column;
use crate::error::{QueryError, QueryResult};
use crate::row::{Row, RowPatch};

/// Provides table data to the query engine.
pub trait DataSource {
    /// Lists the rows of a table, optionally restricted to a view.
    fn list_rows(&self, table_name: &str, view_name: Option<&str>) -> QueryResult<Vec<Row>>;

    /// Lists the columns of a table, optionally as seen by a view.
    fn list_columns(&self, table_name: &str, view_name: Option<&str>) -> QueryResult<Vec<Column>>;

    /// Applies a patch to one row.
    fn update_row(&self, table_name: &str, row_id: &str, patch: &RowPatch) -> QueryResult<()>;

    /// Deletes rows by id.
    fn batch_delete_rows(&self, table_name: &str, row_ids: &[String]) -> QueryResult<()>;
}

/// A table dump: name, columns and rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }
}

/// An in-memory [`DataSource`]. Views are ignored.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a table, builder style.
    pub fn with_table(self, table: Table) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(table.name.clone(), table);
        }
        self
    }

    /// Adds or replaces a table.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::DataSource` if the table store is poisoned.
    pub fn insert_table(&self, table: Table) -> QueryResult<()> {
        self.lock()?.insert(table.name.clone(), table);
        Ok(())
    }

    /// Returns a copy of a table.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::DataSource` for an unknown table.
    pub fn table(&self, table_name: &str) -> QueryResult<Table> {
        let tables = self.lock()?;
        tables
            .get(table_name)
            .cloned()
            .ok_or_else(|| unknown_table(table_name))
    }

    fn lock(&self) -> QueryResult<MutexGuard<'_, HashMap<String, Table>>> {
        self.tables
            .lock()
            .map_err(|_| QueryError::data_source("table store lock poisoned"))
    }
}

fn unknown_table(table_name: &str) -> QueryError {
    QueryError::data_source(format!("table '{table_name}' not found"))
}

impl DataSource for MemorySource {
    fn list_rows(&self, table_name: &str, _view_name: Option<&str>) -> QueryResult<Vec<Row>> {
        Ok(self.table(table_name)?.rows)
    }

    fn list_columns(&self, table_name: &str, _view_name: Option<&str>) -> QueryResult<Vec<Column>> {
        Ok(self.table(table_name)?.columns)
    }

    fn update_row(&self, table_name: &str, row_id: &str, patch: &RowPatch) -> QueryResult<()> {
        let mut tables = self.lock()?;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| unknown_table(table_name))?;
        let row = table
            .rows
            .iter_mut()
            .find(|r| r.id() == row_id)
            .ok_or_else(|| QueryError::data_source(format!("row '{row_id}' not found")))?;
        row.apply_patch(patch);
        debug!(table = table_name, row_id, "row updated");
        Ok(())
    }

    fn batch_delete_rows(&self, table_name: &str, row_ids: &[String]) -> QueryResult<()> {
        let mut tables = self.lock()?;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| unknown_table(table_name))?;
        let before = table.rows.len();
        table.rows.retain(|r| !row_ids.iter().any(|id| id == r.id()));
        debug!(
            table = table_name,
            deleted = before - table.rows.len(),
            "rows deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnKind;
    use serde_json::json;

    fn source() -> MemorySource {
        MemorySource::new().with_table(Table::new(
            "Table1",
            vec![Column::new("0000", "Name", ColumnKind::Text)],
            vec![Row::new("r1").with("Name", "a"), Row::new("r2").with("Name", "b")],
        ))
    }

    #[test]
    fn test_list_rows_and_columns() {
        let source = source();
        assert_eq!(source.list_rows("Table1", None).unwrap().len(), 2);
        assert_eq!(source.list_columns("Table1", Some("Default View")).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_table() {
        assert!(matches!(
            source().list_rows("Nope", None),
            Err(QueryError::DataSource { .. })
        ));
    }

    #[test]
    fn test_update_row() {
        let source = source();
        let mut patch = RowPatch::new();
        patch.insert("Name".to_string(), json!("z"));
        source.update_row("Table1", "r2", &patch).unwrap();
        let rows = source.list_rows("Table1", None).unwrap();
        assert_eq!(rows[1].get("Name"), Some(&json!("z")));
        assert!(source.update_row("Table1", "r9", &patch).is_err());
    }

    #[test]
    fn test_batch_delete_rows() {
        let source = source();
        source
            .batch_delete_rows("Table1", &["r1".to_string()])
            .unwrap();
        let rows = source.list_rows("Table1", None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), "r2");
    }

    #[test]
    fn test_table_deserializes_from_dump() {
        let table: Table = serde_json::from_value(json!({
            "name": "T",
            "columns": [{"key": "0000", "name": "Name", "type": "text"}],
            "rows": [{"_id": "r1", "Name": "x"}]
        }))
        .unwrap();
        assert_eq!(table.rows[0].id(), "r1");
        assert_eq!(table.columns[0].kind, ColumnKind::Text);
    }
}
