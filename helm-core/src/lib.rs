pub mod config;
pub mod dm;
pub mod error;
pub mod kubectl;
pub mod manifest;

pub use config::{ImageDefaults, Settings, StatusSettings};
pub use dm::{uninstall, Component, ComponentParams, Installer};
pub use error::{DmError, Result};
pub use kubectl::{
    runner_for, KubectlCommand, KubectlSettings, PrintRunner, RealRunner, Runner, RunnerKind,
};
