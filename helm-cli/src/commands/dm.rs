//! DM lifecycle commands
//!
//! Commands: install, uninstall, status, target
//!
//! Each command picks its runner once from `--dry-run` and hands it to the
//! operation; only this dispatcher turns errors into user-facing text.

use std::io::Write;

use clap::{Parser, Subcommand};
use helm_core::manifest::DM_LABEL;
use helm_core::{
    dm, runner_for, Component, DmError, ImageDefaults, Installer, Runner, RunnerKind, Settings,
};
use tracing::debug;

use super::CommandFailure;

const DOCTOR_HINT: &str = "(Run 'helm doctor' for more information)";
const UNREACHABLE_HINT: &str = "(Is the cluster running?)";

// === Arg Structs ===

#[derive(Parser, Debug)]
pub struct DmArgs {
    #[command(subcommand)]
    pub command: DmCommands,
}

#[derive(Subcommand, Debug)]
pub enum DmCommands {
    /// Install DM on Kubernetes
    Install(InstallArgs),
    /// Uninstall DM from Kubernetes
    Uninstall(UninstallArgs),
    /// Show status of DM
    Status(QueryArgs),
    /// Display information about the cluster
    Target(QueryArgs),
}

#[derive(Parser, Debug, Default)]
pub struct InstallArgs {
    /// Show what would be installed, but don't install anything
    #[arg(long)]
    pub dry_run: bool,

    /// The full image name of the Docker image for resourcifier
    #[arg(long, env = "HELM_RESOURCIFIER_IMAGE", value_name = "IMAGE")]
    pub resourcifier_image: Option<String>,

    /// The full image name of the Docker image for expandybird
    #[arg(long, env = "HELM_EXPANDYBIRD_IMAGE", value_name = "IMAGE")]
    pub expandybird_image: Option<String>,

    /// The full image name of the Docker image for manager
    #[arg(long, env = "HELM_MANAGER_IMAGE", value_name = "IMAGE")]
    pub manager_image: Option<String>,
}

impl InstallArgs {
    fn image_arg(&self, component: Component) -> Option<&str> {
        match component {
            Component::Resourcifier => self.resourcifier_image.as_deref(),
            Component::Expandybird => self.expandybird_image.as_deref(),
            Component::Manager => self.manager_image.as_deref(),
        }
    }

    /// Flag or env value, then config file, then the installer default
    pub fn installer(&self, defaults: &ImageDefaults) -> Installer {
        let mut installer = Installer::new();
        for component in Component::ALL {
            let image = self
                .image_arg(component)
                .filter(|image| !image.is_empty())
                .or_else(|| defaults.get(component))
                .unwrap_or("");
            installer.set_image(component, image);
        }
        installer
    }
}

#[derive(Parser, Debug, Default)]
pub struct UninstallArgs {
    /// Show what would be removed, but don't remove anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Default)]
pub struct QueryArgs {
    /// Only display the underlying kubectl commands
    #[arg(long)]
    pub dry_run: bool,
}

// === Command Implementations ===

pub fn run_dm(args: DmArgs, settings: &Settings, out: &mut dyn Write) -> Result<(), CommandFailure> {
    dispatch(
        args.command,
        settings,
        |dry_run| runner_for(dry_run, &settings.kubectl),
        out,
    )
}

fn dispatch<F>(
    command: DmCommands,
    settings: &Settings,
    select: F,
    out: &mut dyn Write,
) -> Result<(), CommandFailure>
where
    F: Fn(bool) -> Box<dyn Runner>,
{
    match command {
        DmCommands::Install(args) => {
            let runner = select(args.dry_run);
            let installer = args.installer(&settings.images);
            let output = with_progress(runner.as_ref(), "Installing DM", "DM installed", || {
                installer.install(runner.as_ref())
            })
            .map_err(|e| CommandFailure::reported(format!("{} {}", e, DOCTOR_HINT)))?;
            emit(out, &output)
        }
        DmCommands::Uninstall(args) => {
            let runner = select(args.dry_run);
            let output = with_progress(runner.as_ref(), "Uninstalling DM", "DM uninstalled", || {
                dm::uninstall(runner.as_ref())
            })
            .map_err(|e| {
                CommandFailure::reported(format!(
                    "Error uninstalling: {} {} {}",
                    e.partial_output().trim_end(),
                    e,
                    DOCTOR_HINT
                ))
            })?;
            emit(out, &output)
        }
        DmCommands::Status(args) => {
            let runner = select(args.dry_run);
            let output = status(runner.as_ref()).map_err(|e| {
                if settings.status.report_errors {
                    CommandFailure::reported(e.to_string())
                } else {
                    debug!(error = %e, "status query failed");
                    CommandFailure::silent()
                }
            })?;
            emit(out, &output)
        }
        DmCommands::Target(args) => {
            let runner = select(args.dry_run);
            let output = target(runner.as_ref())
                .map_err(|e| CommandFailure::reported(format!("{} {}", e, UNREACHABLE_HINT)))?;
            emit(out, &output)
        }
    }
}

/// Pods belonging to the DM workload
pub fn status(runner: &dyn Runner) -> helm_core::Result<String> {
    let out = runner.get_by_kind("pods", "", DM_LABEL)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Cluster endpoints as reported by kubectl
pub fn target(runner: &dyn Runner) -> helm_core::Result<String> {
    let out = runner.cluster_info()?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

fn with_progress<T>(
    runner: &dyn Runner,
    msg: &str,
    success_msg: &str,
    f: impl FnOnce() -> Result<T, DmError>,
) -> Result<T, DmError> {
    match runner.kind() {
        RunnerKind::Real => crate::ui::with_spinner(msg, success_msg, f),
        RunnerKind::Print => f(),
    }
}

fn emit(out: &mut dyn Write, text: &str) -> Result<(), CommandFailure> {
    writeln!(out, "{}", text.trim_end_matches('\n'))
        .map_err(|e| CommandFailure::reported(format!("failed to write output: {}", e)))
}
