//! `logtrail` command-line tool for inspecting and running log retention.

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::CommandContext;
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let context = CommandContext {
        config_path: cli.config,
        database_url: cli.database_url,
    };
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Show => writer.render(&commands::show::execute(&context).await?),
        Commands::Cleanup(args) => {
            writer.render(&commands::cleanup::execute(&context, &args).await?)
        }
        Commands::Update(args) => writer.render(&commands::update::execute(&context, &args).await?),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
