//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the stq CLI.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// stq - Query SeaTable table dumps and compile view filters to SQL
#[derive(Parser, Debug)]
#[command(name = "stq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a filter specification into a SQL query
    Sql {
        /// Column metadata: a JSON array of columns or a table dump
        #[arg(short, long)]
        columns: PathBuf,

        /// Filter specification JSON file ("-" reads stdin)
        #[arg(short, long, default_value = "-")]
        spec: PathBuf,

        /// Table name used in the FROM clause
        #[arg(short, long)]
        table: String,

        /// Row offset (default: from config, then 0)
        #[arg(long)]
        start: Option<usize>,

        /// Row limit (default: from config, then 500)
        #[arg(long)]
        limit: Option<usize>,

        /// Resolve relative dates against this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Filter the rows of a table dump with a textual condition
    #[command(alias = "f")]
    Filter {
        /// Table dump JSON file with name, columns and rows ("-" reads stdin)
        #[arg(short = 'f', long)]
        table_file: PathBuf,

        /// Condition (e.g., "Name like 'A%' and Age > 18"); empty keeps all rows
        #[arg(default_value = "")]
        condition: String,

        /// Print only the first matching row
        #[arg(long, conflicts_with = "count")]
        first: bool,

        /// Print only the number of matching rows
        #[arg(long)]
        count: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print config file path
    Path,
}

/// Supported shells for completions
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["stq", "--verbose", "config"]);
        assert!(cli.verbose);
        assert!(!cli.quiet);
        assert!(!cli.json);

        let cli = Cli::parse_from(["stq", "--quiet", "--json", "config"]);
        assert!(!cli.verbose);
        assert!(cli.quiet);
        assert!(cli.json);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["stq", "-q", "-v", "config"]).is_err());
    }

    #[test]
    fn test_sql_arguments() {
        let cli = Cli::parse_from([
            "stq",
            "sql",
            "--columns",
            "cols.json",
            "--table",
            "Table1",
            "--limit",
            "10",
            "--today",
            "2021-12-06",
        ]);
        match cli.command {
            Some(Commands::Sql {
                columns,
                spec,
                table,
                start,
                limit,
                today,
            }) => {
                assert_eq!(columns, PathBuf::from("cols.json"));
                assert_eq!(spec, PathBuf::from("-"));
                assert_eq!(table, "Table1");
                assert_eq!(start, None);
                assert_eq!(limit, Some(10));
                assert_eq!(today, NaiveDate::from_ymd_opt(2021, 12, 6));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_sql_rejects_bad_today() {
        assert!(Cli::try_parse_from([
            "stq", "sql", "-c", "c.json", "-t", "T", "--today", "06/12/2021"
        ])
        .is_err());
    }

    #[test]
    fn test_filter_arguments() {
        let cli = Cli::parse_from(["stq", "f", "-f", "dump.json", "Age > 18", "--count"]);
        match cli.command {
            Some(Commands::Filter {
                table_file,
                condition,
                first,
                count,
            }) => {
                assert_eq!(table_file, PathBuf::from("dump.json"));
                assert_eq!(condition, "Age > 18");
                assert!(!first);
                assert!(count);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_filter_condition_defaults_to_empty() {
        let cli = Cli::parse_from(["stq", "filter", "--table-file", "dump.json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Filter { ref condition, .. }) if condition.is_empty()
        ));
    }

    #[test]
    fn test_first_conflicts_with_count() {
        assert!(Cli::try_parse_from(["stq", "filter", "-f", "d.json", "--first", "--count"]).is_err());
    }

    #[test]
    fn test_config_subcommands() {
        let cli = Cli::parse_from(["stq", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                command: Some(ConfigCommands::Path)
            })
        ));
    }

    #[test]
    fn test_completions_shell() {
        let cli = Cli::parse_from(["stq", "completions", "powershell"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Completions {
                shell: Shell::Powershell
            })
        ));
    }
}
