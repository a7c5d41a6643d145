//! helm CLI - Deployment Manager lifecycle on Kubernetes
//!
//! This is the main entry point for the `helm` command-line tool, which provides:
//! - DM install, uninstall, status and cluster target (`dm` subcommand)
//! - Settings inspection (`config` subcommand)
//! - Shell completion scripts (`completions` subcommand)
//!
//! Every cluster interaction shells out to kubectl; `--dry-run` prints the
//! kubectl commands instead of running them.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use helm_core::Settings;

mod commands;
mod config;
mod tracing_setup;
mod ui;

use commands::CommandFailure;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "helm",
    author,
    version,
    about = "Manage the Deployment Manager (DM) on Kubernetes",
    long_about = "Install, uninstall and inspect the Deployment Manager services on a \
                  Kubernetes cluster by driving kubectl. Use --dry-run on any dm command \
                  to print the kubectl commands instead of running them."
)]
struct Cli {
    /// Suppress progress spinners (for script consumption)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// kubectl program to run
    #[arg(long, global = true, env = "HELM_KUBECTL", value_name = "PROGRAM")]
    kubectl: Option<String>,

    /// Kubernetes context passed to kubectl
    #[arg(long, global = true, env = "HELM_KUBE_CONTEXT", value_name = "NAME")]
    context: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage DM on Kubernetes
    Dm(commands::dm::DmArgs),
    /// Inspect helm settings (path, show)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();
    ui::init_quiet_mode(cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            if let Some(message) = failure.message() {
                ui::error(message);
            }
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<(), CommandFailure> {
    match cli.command {
        Commands::Dm(args) => {
            let settings = load_settings(cli.kubectl, cli.context)?;
            let mut stdout = io::stdout().lock();
            commands::run_dm(args, &settings, &mut stdout)
        }
        Commands::Config(args) => {
            let settings = load_settings(cli.kubectl, cli.context)?;
            config::run_config(args, &settings)?;
            Ok(())
        }
        Commands::Completions(args) => {
            run_completions(args);
            Ok(())
        }
    }
}

/// Settings file + env, then global flags on top
fn load_settings(kubectl: Option<String>, context: Option<String>) -> Result<Settings> {
    let mut settings = Settings::load().context("Failed to load settings")?;

    if let Some(program) = kubectl.filter(|p| !p.is_empty()) {
        settings.kubectl.program = program;
    }
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        settings.kubectl.context = Some(context);
    }

    Ok(settings)
}

fn run_completions(args: CompletionsArgs) {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
