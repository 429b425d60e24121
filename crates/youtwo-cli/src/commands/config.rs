use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use youtwo_core::YouTwoConfig;

use crate::cli::ConfigCommands;

/// Execute config subcommand
pub async fn execute(cmd: ConfigCommands, config: &YouTwoConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Init { path, force } => init(path, force),
        ConfigCommands::Show { format } => show(config, &format),
    }
}

/// Initialize a new config file
fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = path
        .or_else(YouTwoConfig::default_config_path)
        .context("Could not determine config file path")?;

    if config_path.exists() && !force {
        bail!(
            "Config file already exists at: {} (use --force to overwrite)",
            config_path.display()
        );
    }

    YouTwoConfig::write_example(&config_path, force)?;

    println!(
        "{} Created config file at: {}",
        "Success:".green().bold(),
        config_path.display()
    );
    println!(
        "{}",
        "Set convex.url (or CONVEX_URL) to fetch from your deployment.".dimmed()
    );
    Ok(())
}

/// Show the effective configuration
fn show(config: &YouTwoConfig, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(config)?),
        _ => println!("{}", config.to_toml()?),
    }
    Ok(())
}
