//! Row records and row-change message conversion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::column::{Column, ColumnKind};

/// Key of the unique row identifier.
pub const ROW_ID_KEY: &str = "_id";

/// A partial row used by update operations: column name to new cell value.
pub type RowPatch = Map<String, Value>;

/// A table row: column name (or internal key) to cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    /// Creates a row with the given id and no cells.
    pub fn new(id: impl Into<String>) -> Self {
        let mut cells = Map::new();
        cells.insert(ROW_ID_KEY.to_string(), Value::String(id.into()));
        Self(cells)
    }

    /// Adds a cell, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Returns the row id, or the empty string if the row carries none.
    pub fn id(&self) -> &str {
        self.0.get(ROW_ID_KEY).and_then(Value::as_str).unwrap_or_default()
    }

    /// Returns the cell stored under a column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Overwrites cells with the values of a patch.
    pub fn apply_patch(&mut self, patch: &RowPatch) {
        for (column, value) in patch {
            self.0.insert(column.clone(), value.clone());
        }
    }

    /// Returns the underlying cell map.
    pub fn cells(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the row, returning the underlying cell map.
    pub fn into_cells(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Row {
    fn from(cells: Map<String, Value>) -> Self {
        Self(cells)
    }
}

/// Converts a row-change message into a readable row.
///
/// The message carries cells keyed by column key, with select cells holding
/// option ids. The result is keyed by column name with option names resolved,
/// plus `_id`, `op_type` and `table_name`. Cells of unknown columns (internal
/// fields) are dropped. Messages for operations other than `insert_row`,
/// `modify_row` and `delete_row` are returned unchanged.
pub fn convert_row(message: &Value, table_name: &str, columns: &[Column]) -> Value {
    let op_type = message.get("op_type").and_then(Value::as_str).unwrap_or_default();
    let payload_key = match op_type {
        "insert_row" => "row_data",
        "modify_row" => "updated",
        "delete_row" => "deleted_row",
        _ => return message.clone(),
    };
    let Some(Value::Object(cells)) = message.get(payload_key) else {
        return message.clone();
    };

    let mut result = Map::new();
    result.insert(
        ROW_ID_KEY.to_string(),
        message.get("row_id").cloned().unwrap_or(Value::Null),
    );
    result.insert("op_type".to_string(), Value::String(op_type.to_string()));
    result.insert("table_name".to_string(), Value::String(table_name.to_string()));

    for (key, cell) in cells {
        let Some(column) = columns.iter().find(|c| &c.key == key) else {
            continue;
        };
        if let Some(value) = readable_cell(column, cell) {
            result.insert(column.name.clone(), value);
        }
    }

    Value::Object(result)
}

fn readable_cell(column: &Column, cell: &Value) -> Option<Value> {
    let option_name = |id: &Value| -> Option<Value> {
        let data = column.data.as_ref()?;
        let name = data.option_name(id.as_str()?)?;
        Some(Value::String(name.to_string()))
    };
    let has_options = column.data.as_ref().is_some_and(|d| !d.options.is_empty());

    match column.kind {
        ColumnKind::SingleSelect if is_truthy(cell) => {
            if !has_options {
                return None;
            }
            Some(option_name(cell).unwrap_or(Value::Null))
        }
        ColumnKind::MultipleSelect if is_truthy(cell) => {
            if !has_options {
                return None;
            }
            let ids = cell.as_array()?;
            Some(Value::Array(
                ids.iter()
                    .map(|id| option_name(id).unwrap_or(Value::Null))
                    .collect(),
            ))
        }
        ColumnKind::LongText => Some(
            cell.get("text")
                .cloned()
                .unwrap_or_else(|| Value::String(String::new())),
        ),
        _ => Some(cell.clone()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
