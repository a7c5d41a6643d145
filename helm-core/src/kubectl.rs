//! kubectl command model and the two runner strategies
//!
//! Every cluster interaction goes through [`Runner`]. [`RealRunner`] shells out
//! to kubectl and returns its stdout; [`PrintRunner`] renders the command it
//! would have run and never spawns anything. [`runner_for`] is the only place
//! that picks between them.

use std::fmt;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DmError, Result};

/// Program used when nothing else is configured
pub const DEFAULT_PROGRAM: &str = "kubectl";

/// How kubectl is invoked (program path and optional kube context)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlSettings {
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Default for KubectlSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            context: None,
        }
    }
}

impl KubectlSettings {
    /// Full argument vector for `cmd`, context flag first
    pub fn argv(&self, cmd: &KubectlCommand) -> Vec<String> {
        let mut argv = Vec::with_capacity(cmd.args.len() + 1);
        if let Some(context) = self.context.as_deref().filter(|c| !c.is_empty()) {
            argv.push(format!("--context={}", context));
        }
        argv.extend(cmd.args.iter().cloned());
        argv
    }

    /// Human-readable command line (no stdin)
    pub fn command_line(&self, cmd: &KubectlCommand) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.argv(cmd));
        parts.join(" ")
    }
}

/// A single kubectl invocation: arguments plus optional stdin payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubectlCommand {
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
}

impl KubectlCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn stdin(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }

    /// `kubectl cluster-info`
    pub fn cluster_info() -> Self {
        Self::new(["cluster-info"])
    }

    /// `kubectl create -f -` with the manifest on stdin
    pub fn create(stdin: &[u8], namespace: &str) -> Self {
        let mut args = vec!["create".to_string(), "-f".to_string(), "-".to_string()];
        if !namespace.is_empty() {
            args.push(format!("--namespace={}", namespace));
        }
        Self::new(args).with_stdin(stdin)
    }

    /// `kubectl delete <kind> <name>`
    pub fn delete(name: &str, kind: &str) -> Self {
        Self::new(["delete", kind, name])
    }

    /// `kubectl get <kind>`, scoped to a namespace (or all) and a label selector
    pub fn get_by_kind(kind: &str, namespace: &str, label_selector: &str) -> Self {
        let mut args = vec!["get".to_string(), kind.to_string()];
        if namespace.is_empty() {
            args.push("--all-namespaces".to_string());
        } else {
            args.push(format!("--namespace={}", namespace));
        }
        if !label_selector.is_empty() {
            args.push("-l".to_string());
            args.push(label_selector.to_string());
        }
        Self::new(args)
    }
}

/// Which execution strategy a runner uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerKind {
    Real,
    Print,
}

impl RunnerKind {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunnerKind::Print
        } else {
            RunnerKind::Real
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerKind::Real => write!(f, "real"),
            RunnerKind::Print => write!(f, "print"),
        }
    }
}

/// Execution capability for kubectl commands.
///
/// Implementors only provide [`Runner::run`]; the collaborator methods build
/// the matching [`KubectlCommand`] and hand it over.
pub trait Runner {
    fn kind(&self) -> RunnerKind;

    fn run(&self, cmd: &KubectlCommand) -> Result<Vec<u8>>;

    fn cluster_info(&self) -> Result<Vec<u8>> {
        self.run(&KubectlCommand::cluster_info())
    }

    fn create(&self, stdin: &[u8], namespace: &str) -> Result<Vec<u8>> {
        self.run(&KubectlCommand::create(stdin, namespace))
    }

    fn delete(&self, name: &str, kind: &str) -> Result<Vec<u8>> {
        self.run(&KubectlCommand::delete(name, kind))
    }

    fn get_by_kind(&self, kind: &str, namespace: &str, label_selector: &str) -> Result<Vec<u8>> {
        self.run(&KubectlCommand::get_by_kind(kind, namespace, label_selector))
    }
}

/// Runs kubectl for real and returns its stdout
#[derive(Debug, Clone, Default)]
pub struct RealRunner {
    settings: KubectlSettings,
}

impl RealRunner {
    pub fn new(settings: KubectlSettings) -> Self {
        Self { settings }
    }
}

impl Runner for RealRunner {
    fn kind(&self) -> RunnerKind {
        RunnerKind::Real
    }

    fn run(&self, cmd: &KubectlCommand) -> Result<Vec<u8>> {
        let line = self.settings.command_line(cmd);
        debug!(command = %line, "running kubectl");

        let mut child = Command::new(&self.settings.program)
            .args(self.settings.argv(cmd))
            .stdin(if cmd.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DmError::spawn(&line, e))?;

        if let (Some(input), Some(mut pipe)) = (cmd.stdin(), child.stdin.take()) {
            // A child that exits before reading stdin reports its own error below
            if let Err(e) = pipe.write_all(input) {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            debug!(command = %line, code, "kubectl failed");
            return Err(DmError::CommandFailed {
                command: line,
                code,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// Renders commands instead of running them (dry-run)
#[derive(Debug, Clone, Default)]
pub struct PrintRunner {
    settings: KubectlSettings,
}

impl PrintRunner {
    pub fn new(settings: KubectlSettings) -> Self {
        Self { settings }
    }

    /// `[CMD] kubectl <args>` followed by ` < <stdin>` when there is a payload
    pub fn render(&self, cmd: &KubectlCommand) -> String {
        let line = self.settings.command_line(cmd);
        match cmd.stdin() {
            Some(stdin) => format!("[CMD] {} < {}", line, String::from_utf8_lossy(stdin)),
            None => format!("[CMD] {}", line),
        }
    }
}

impl Runner for PrintRunner {
    fn kind(&self) -> RunnerKind {
        RunnerKind::Print
    }

    fn run(&self, cmd: &KubectlCommand) -> Result<Vec<u8>> {
        Ok(self.render(cmd).into_bytes())
    }
}

/// Pick the runner for this invocation: dry-run prints, otherwise executes
pub fn runner_for(dry_run: bool, settings: &KubectlSettings) -> Box<dyn Runner> {
    match RunnerKind::from_dry_run(dry_run) {
        RunnerKind::Print => Box::new(PrintRunner::new(settings.clone())),
        RunnerKind::Real => Box::new(RealRunner::new(settings.clone())),
    }
}
