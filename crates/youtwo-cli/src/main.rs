use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use youtwo_cli::{
    cli::{Cli, Commands},
    commands,
};
use youtwo_core::YouTwoConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.level_filter());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Flags win over RUST_LOG; without either only warnings are shown.
/// Logs go to stderr so command output can be piped.
fn init_logging(level: Option<LevelFilter>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = YouTwoConfig::load(cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Visualize(args) => commands::visualize::execute(args, &config).await,
        Commands::Pipeline(args) => commands::pipeline::execute(args, &config).await,
        Commands::Call { function, args } => {
            commands::call::execute(function, args, &config.convex).await
        }
        Commands::Functions => commands::functions::execute(&config.convex).await,
        Commands::Config(cmd) => commands::config::execute(cmd, &config).await,
    }
}
