use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use commands::config::load_config;
use commands::filter::FilterOptions;
use commands::sql::SqlOptions;
use commands::{CommandContext, CommandError};
use seatable_query::QueryError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                let text = serde_json::to_string_pretty(&error_json)
                    .unwrap_or_else(|_| error_json.to_string());
                eprintln!("{text}");
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Installs the tracing subscriber on stderr.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug and `--quiet` errors only.
fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let config = load_config()?;
    let ctx = CommandContext::from_cli(cli, &config);

    match &cli.command {
        Some(Commands::Sql {
            columns,
            spec,
            table,
            start,
            limit,
            today,
        }) => {
            let opts = SqlOptions {
                columns: columns.clone(),
                spec: spec.clone(),
                table: table.clone(),
                start: *start,
                limit: *limit,
                today: *today,
            };
            commands::sql::execute(&ctx, &opts, &config)
        }
        Some(Commands::Filter {
            table_file,
            condition,
            first,
            count,
        }) => {
            let opts = FilterOptions {
                table_file: table_file.clone(),
                condition: condition.clone(),
                first: *first,
                count: *count,
            };
            commands::filter::execute(&ctx, &opts)
        }
        Some(Commands::Config { command }) => match command {
            Some(ConfigCommands::Path) => commands::config::execute_path(&ctx),
            Some(ConfigCommands::Show) | None => commands::config::execute_show(&ctx, &config),
        },
        Some(Commands::Completions { shell }) => {
            commands::completions::execute(shell)?;
            Ok(())
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Returns a machine-readable error code for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Query(q) => match q {
            QueryError::Syntax(_) => "SYNTAX_ERROR",
            QueryError::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            QueryError::InvalidSpecification { .. } => "INVALID_SPECIFICATION",
            QueryError::DataSource { .. } => "DATA_SOURCE_ERROR",
            _ => "QUERY_ERROR",
        },
        CommandError::Config(_) => "CONFIG_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the process exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Query(QueryError::DataSource { .. }) => ExitCode::from(2),
        CommandError::Query(_) => ExitCode::from(1),
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Json(_) => ExitCode::from(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CommandError::from(QueryError::column_not_found("Email"));
        assert_eq!(error_code(&err), "COLUMN_NOT_FOUND");
        assert_eq!(error_exit_code(&err), ExitCode::from(1));

        let err = CommandError::from(QueryError::data_source("table 'T' not found"));
        assert_eq!(error_code(&err), "DATA_SOURCE_ERROR");
        assert_eq!(error_exit_code(&err), ExitCode::from(2));

        let err = CommandError::Config("bad".to_string());
        assert_eq!(error_code(&err), "CONFIG_ERROR");
        assert_eq!(error_exit_code(&err), ExitCode::from(5));
    }
}
