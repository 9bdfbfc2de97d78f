//! Filter command implementation.
//!
//! Loads a table dump and evaluates a textual condition over its rows.

use std::path::PathBuf;

use seatable_query::{MemorySource, QuerySet, Row, Table};
use tracing::debug;

use super::{read_input, CommandContext, Result};
use crate::output::{format_rows_json, format_rows_table};

/// Options for the filter command.
#[derive(Debug)]
pub struct FilterOptions {
    /// Table dump file, or `-` for stdin.
    pub table_file: PathBuf,
    /// Condition text.
    pub condition: String,
    /// Print only the first match.
    pub first: bool,
    /// Print only the match count.
    pub count: bool,
}

/// Executes the filter command.
pub fn execute(ctx: &CommandContext, opts: &FilterOptions) -> Result<()> {
    let table: Table = serde_json::from_str(&read_input(&opts.table_file)?)?;
    let table_name = table.name.clone();
    let source = MemorySource::new().with_table(table);

    let matches = seatable_query::filter(&source, &table_name, &opts.condition, None)?;
    debug!(table = %table_name, matched = matches.count(), "condition evaluated");

    if opts.count {
        print_count(ctx, &matches);
        return Ok(());
    }

    let selected = select(&matches, opts.first);
    if ctx.json_output {
        if opts.first {
            println!("{}", serde_json::to_string_pretty(&selected.first())?);
        } else {
            println!("{}", format_rows_json(&table_name, &selected)?);
        }
    } else if !ctx.quiet {
        print!(
            "{}",
            format_rows_table(&selected, matches.columns(), ctx.use_colors)
        );
    }
    Ok(())
}

/// Picks the rows to print: every match, or just the first one.
fn select<'q>(matches: &'q QuerySet<'_, MemorySource>, first: bool) -> Vec<&'q Row> {
    if first {
        matches.iter().take(1).collect()
    } else {
        matches.iter().collect()
    }
}

fn print_count(ctx: &CommandContext, matches: &QuerySet<'_, MemorySource>) {
    if ctx.json_output {
        println!("{}", serde_json::json!({ "count": matches.count() }));
    } else {
        println!("{}", matches.count());
    }
}
