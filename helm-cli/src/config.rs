use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use helm_core::Settings;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Show effective settings (file, environment and global flags merged)
    Show,
}

pub fn run_config(args: ConfigArgs, settings: &Settings) -> Result<()> {
    match args.command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(settings),
    }
}

fn run_path() -> Result<()> {
    println!("{}", Settings::config_path().display());
    Ok(())
}

fn run_show(settings: &Settings) -> Result<()> {
    let toml_str = settings
        .to_toml()
        .context("Failed to serialize settings to TOML")?;

    print!("{}", toml_str);

    Ok(())
}
