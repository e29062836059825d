//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Sparkify ETL - stage, load and check the Sparkify star schema
#[derive(Parser, Debug)]
#[command(name = "sparkify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the workflow config file (default: ./sparkify.yml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the warehouse database path (also read from SF_WAREHOUSE)
    #[arg(short, long, global = true)]
    pub warehouse: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one run of the workflow
    Run(RunArgs),

    /// List tasks and their dependencies
    Ls(LsArgs),

    /// Validate config, graph and SQL without touching the warehouse
    Validate(ValidateArgs),

    /// Run the data quality checks only
    Check(CheckArgs),

    /// Create the staging, fact and dimension tables
    CreateTables(CreateTablesArgs),
}

/// Output format for run and check
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON report on stdout
    Json,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task selector (task, +task, task+, +task+)
    #[arg(short, long)]
    pub select: Option<String>,

    /// Start of the data interval to cover (RFC 3339 or YYYY-MM-DD).
    /// Defaults to the latest completed schedule interval.
    #[arg(long)]
    pub logical_date: Option<String>,

    /// Number of tasks to execute concurrently
    #[arg(short, long, default_value = "4")]
    pub threads: usize,

    /// Override the configured number of retries
    #[arg(long)]
    pub retries: Option<u32>,

    /// Create missing tables before running
    #[arg(long)]
    pub create_tables: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,

    /// Task selector (task, +task, task+, +task+)
    #[arg(short, long)]
    pub select: Option<String>,
}

/// ls output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Dependency tree
    Tree,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the create-tables command
#[derive(Args, Debug)]
pub struct CreateTablesArgs {
    /// Print the DDL instead of executing it
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
