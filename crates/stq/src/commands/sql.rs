//! Sql command implementation.
//!
//! Compiles a view filter specification into one SQL query.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use seatable_query::column::Column;
use seatable_query::{FilterSpecification, SqlGenerator, Table, DEFAULT_LIMIT, DEFAULT_START};
use serde_json::Value;
use tracing::debug;

use super::config::Config;
use super::{read_input, CommandContext, CommandError, Result};
use crate::output::SqlOutput;

/// Options for the sql command.
#[derive(Debug)]
pub struct SqlOptions {
    /// Column metadata file.
    pub columns: PathBuf,
    /// Filter specification file, or `-` for stdin.
    pub spec: PathBuf,
    /// Table name for the FROM clause.
    pub table: String,
    /// Row offset override.
    pub start: Option<usize>,
    /// Row limit override.
    pub limit: Option<usize>,
    /// Reference day for relative dates.
    pub today: Option<NaiveDate>,
}

/// Executes the sql command and prints the query.
pub fn execute(ctx: &CommandContext, opts: &SqlOptions, config: &Config) -> Result<()> {
    let sql = compile(opts, config)?;

    if ctx.json_output {
        let output = SqlOutput {
            table: &opts.table,
            sql: &sql,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{sql}");
    }
    Ok(())
}

/// Builds the query text without printing it.
pub fn compile(opts: &SqlOptions, config: &Config) -> Result<String> {
    if opts.columns == opts.spec && opts.spec == Path::new("-") {
        return Err(CommandError::Config(
            "columns and specification cannot both be read from stdin".to_string(),
        ));
    }

    let columns = load_columns(&read_input(&opts.columns)?)?;
    let spec = FilterSpecification::from_json(&read_input(&opts.spec)?)?;

    let start = opts.start.or(config.query.start).unwrap_or(DEFAULT_START);
    let limit = opts.limit.or(config.query.limit).unwrap_or(DEFAULT_LIMIT);
    debug!(table = %opts.table, columns = columns.len(), start, limit, "compiling specification");

    let mut generator = SqlGenerator::new(&opts.table, &columns);
    if let Some(today) = opts.today {
        generator = generator.with_today(today);
    }
    Ok(generator.to_sql(&spec, start, limit)?)
}

/// Parses column metadata from either a bare array or a full table dump.
pub fn load_columns(content: &str) -> Result<Vec<Column>> {
    let value: Value = serde_json::from_str(content)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(ref map) if map.contains_key("columns") => {
            let table: Table = serde_json::from_value(value)?;
            Ok(table.columns)
        }
        _ => Err(CommandError::Config(
            "column metadata must be a JSON array or an object with a \"columns\" field"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatable_query::QueryError;
    use std::fs;
    use tempfile::TempDir;

    const COLUMNS: &str = r#"[
        {"key": "0000", "name": "Name", "type": "text"},
        {"key": "a1", "name": "Age", "type": "number"},
        {"key": "d1", "name": "Due", "type": "date"}
    ]"#;

    fn options(dir: &TempDir, columns: &str, spec: &str) -> SqlOptions {
        let columns_path = dir.path().join("columns.json");
        let spec_path = dir.path().join("spec.json");
        fs::write(&columns_path, columns).unwrap();
        fs::write(&spec_path, spec).unwrap();
        SqlOptions {
            columns: columns_path,
            spec: spec_path,
            table: "Table1".to_string(),
            start: None,
            limit: None,
            today: NaiveDate::from_ymd_opt(2021, 12, 6),
        }
    }

    #[test]
    fn test_compile_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(
            &dir,
            COLUMNS,
            r#"{"filters": [{"column_name": "Age", "filter_predicate": "greater", "filter_term": 18}]}"#,
        );
        let sql = compile(&opts, &Config::default()).unwrap();
        assert_eq!(sql, "SELECT * FROM Table1 WHERE Age > 18 LIMIT 0, 500");
    }

    #[test]
    fn test_config_limits_and_flag_override() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(&dir, COLUMNS, "{}");
        let mut config = Config::default();
        config.query.start = Some(20);
        config.query.limit = Some(10);

        assert_eq!(
            compile(&opts, &config).unwrap(),
            "SELECT * FROM Table1 LIMIT 20, 10"
        );

        opts.limit = Some(3);
        assert_eq!(
            compile(&opts, &config).unwrap(),
            "SELECT * FROM Table1 LIMIT 20, 3"
        );
    }

    #[test]
    fn test_today_pins_relative_dates() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(
            &dir,
            COLUMNS,
            r#"{"filters": [{"column_name": "Due", "filter_predicate": "is_within", "filter_term_modifier": "this_week"}]}"#,
        );
        assert_eq!(
            compile(&opts, &Config::default()).unwrap(),
            "SELECT * FROM Table1 WHERE Due >= '2021-12-05' and Due < '2021-12-11' LIMIT 0, 500"
        );
    }

    #[test]
    fn test_columns_from_table_dump() {
        let dump = format!(r#"{{"name": "Table1", "columns": {COLUMNS}, "rows": []}}"#);
        let columns = load_columns(&dump).unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[2].name, "Due");
    }

    #[test]
    fn test_bad_column_metadata() {
        assert!(matches!(
            load_columns(r#"{"name": "T"}"#),
            Err(CommandError::Config(_))
        ));
        assert!(matches!(load_columns("not json"), Err(CommandError::Json(_))));
    }

    #[test]
    fn test_specification_errors_are_query_errors() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(
            &dir,
            COLUMNS,
            r#"{"filters": [], "filter_groups": [], "filter_conjunction": "Xor"}"#,
        );
        assert!(matches!(
            compile(&opts, &Config::default()),
            Err(CommandError::Query(QueryError::InvalidSpecification { .. }))
        ));
    }

    #[test]
    fn test_both_inputs_from_stdin_rejected() {
        let opts = SqlOptions {
            columns: PathBuf::from("-"),
            spec: PathBuf::from("-"),
            table: "T".to_string(),
            start: None,
            limit: None,
            today: None,
        };
        assert!(matches!(
            compile(&opts, &Config::default()),
            Err(CommandError::Config(_))
        ));
    }
}
