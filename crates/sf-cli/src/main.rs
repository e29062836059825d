//! Sparkify ETL CLI - stage event and song data, load the star schema and
//! check the result

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands, GlobalArgs};
use commands::common::ExitCode;
use commands::{check, create_tables, ls, run, validate};

/// Install the fmt subscriber. `RUST_LOG` wins over `--verbose`; `log`
/// records from the library crates are bridged into it.
fn init_logging(global: &GlobalArgs) {
    let default_level = if global.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore the error if a subscriber was already installed
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(global.verbose)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init();
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => run::execute(args, &cli.global).await,
        Commands::Ls(args) => ls::execute(args, &cli.global).await,
        Commands::Validate(args) => validate::execute(args, &cli.global).await,
        Commands::Check(args) => check::execute(args, &cli.global).await,
        Commands::CreateTables(args) => create_tables::execute(args, &cli.global).await,
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match dispatch(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::ExitCode::from(code.0),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::ExitCode::FAILURE
            }
        },
    }
}
