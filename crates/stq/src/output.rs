//! Output formatting for the stq CLI.
//!
//! Rows are printed as a fixed-width table or as JSON.

use owo_colors::OwoColorize;
use seatable_query::column::Column;
use seatable_query::Row;
use serde::Serialize;
use serde_json::Value;

/// Maximum display width of a table cell.
const CELL_WIDTH: usize = 20;

/// JSON output structure for the filter command.
#[derive(Serialize)]
pub struct RowsOutput<'a> {
    pub table: &'a str,
    pub count: usize,
    pub rows: Vec<&'a Row>,
}

/// JSON output structure for the sql command.
#[derive(Serialize)]
pub struct SqlOutput<'a> {
    pub table: &'a str,
    pub sql: &'a str,
}

/// Formats rows as JSON.
pub fn format_rows_json(table: &str, rows: &[&Row]) -> Result<String, serde_json::Error> {
    let output = RowsOutput {
        table,
        count: rows.len(),
        rows: rows.to_vec(),
    };
    serde_json::to_string_pretty(&output)
}

/// Formats rows as a table, one column per table column in declared order.
pub fn format_rows_table(rows: &[&Row], columns: &[Column], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No rows found.\n".to_string();
    }

    let mut output = String::new();

    let mut header = format!("{:<8}", "ID");
    for column in columns {
        header.push(' ');
        header.push_str(&pad(&truncate_str(&column.name, CELL_WIDTH)));
    }
    let header = header.trim_end().to_string();
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for row in rows {
        let id = format!("{:<8}", truncate_id(row.id()));
        let mut line = if use_colors {
            id.cyan().to_string()
        } else {
            id
        };
        for column in columns {
            let cell = row.get(&column.name).map(format_cell).unwrap_or_default();
            line.push(' ');
            line.push_str(&pad(&truncate_str(&cell, CELL_WIDTH)));
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// Renders one cell value for the table view.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "✓".to_string(),
        Value::Bool(false) => String::new(),
        Value::String(s) => s.lines().next().unwrap_or_default().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(format_cell)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => match map.get("text").or_else(|| map.get("name")) {
            Some(inner) => format_cell(inner),
            None => value.to_string(),
        },
    }
}

/// Truncates a row id to 6 characters for display.
pub fn truncate_id(id: &str) -> String {
    id.chars().take(6).collect()
}

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

fn pad(s: &str) -> String {
    let width = s.chars().count();
    format!("{s}{}", " ".repeat(CELL_WIDTH.saturating_sub(width)))
}
