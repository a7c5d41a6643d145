//! DM installer and uninstaller
//!
//! Both operations are written against [`Runner`], so the same code either
//! changes the cluster or just shows what it would run.

use std::fmt;

use tracing::info;

use crate::error::Result;
use crate::kubectl::Runner;
use crate::manifest::{self, DM_NAMESPACE};

/// Registry the default images are pulled from
pub const DEFAULT_REGISTRY: &str = "gcr.io/kubernetes-helm";

/// The three DM services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Expandybird,
    Resourcifier,
    Manager,
}

impl Component {
    /// Install order
    pub const ALL: [Component; 3] = [
        Component::Expandybird,
        Component::Resourcifier,
        Component::Manager,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Component::Expandybird => "expandybird",
            Component::Resourcifier => "resourcifier",
            Component::Manager => "manager",
        }
    }

    pub fn port(self) -> u16 {
        match self {
            Component::Manager => 8080,
            Component::Expandybird => 8081,
            Component::Resourcifier => 8082,
        }
    }

    pub fn default_image(self) -> String {
        format!("{}/{}:latest", DEFAULT_REGISTRY, self.name())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-component render parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentParams {
    /// Image reference; `None` means the component default
    pub image: Option<String>,
}

/// Renders and creates the DM workload
#[derive(Debug, Clone, Default)]
pub struct Installer {
    pub expandybird: ComponentParams,
    pub resourcifier: ComponentParams,
    pub manager: ComponentParams,
}

impl Installer {
    pub fn new() -> Self {
        Self::default()
    }

    fn params(&self, component: Component) -> &ComponentParams {
        match component {
            Component::Expandybird => &self.expandybird,
            Component::Resourcifier => &self.resourcifier,
            Component::Manager => &self.manager,
        }
    }

    fn params_mut(&mut self, component: Component) -> &mut ComponentParams {
        match component {
            Component::Expandybird => &mut self.expandybird,
            Component::Resourcifier => &mut self.resourcifier,
            Component::Manager => &mut self.manager,
        }
    }

    /// Override a component image. An empty string keeps the current value.
    pub fn set_image(&mut self, component: Component, image: &str) -> &mut Self {
        if !image.is_empty() {
            self.params_mut(component).image = Some(image.to_string());
        }
        self
    }

    /// Image that will be installed for `component`
    pub fn image(&self, component: Component) -> String {
        self.params(component)
            .image
            .clone()
            .unwrap_or_else(|| component.default_image())
    }

    /// Manifest this installer would create
    pub fn manifest(&self) -> Result<String> {
        let images: Vec<(Component, String)> = Component::ALL
            .iter()
            .map(|c| (*c, self.image(*c)))
            .collect();
        manifest::render(&images)
    }

    /// Create the DM workload through `runner`, returning kubectl's output
    pub fn install(&self, runner: &dyn Runner) -> Result<String> {
        let manifest = self.manifest()?;
        info!(
            runner = %runner.kind(),
            manager = %self.image(Component::Manager),
            resourcifier = %self.image(Component::Resourcifier),
            expandybird = %self.image(Component::Expandybird),
            "installing dm"
        );
        let out = runner.create(manifest.as_bytes(), "")?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Remove the DM workload by deleting its namespace
pub fn uninstall(runner: &dyn Runner) -> Result<String> {
    info!(runner = %runner.kind(), namespace = DM_NAMESPACE, "uninstalling dm");
    let out = runner.delete(DM_NAMESPACE, "namespace")?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DmError;
    use crate::kubectl::{KubectlCommand, PrintRunner, RunnerKind};
    use std::cell::RefCell;

    /// Records every command instead of running it
    #[derive(Default)]
    struct Recorder {
        commands: RefCell<Vec<KubectlCommand>>,
        fail_with: Option<(String, String)>,
    }

    impl Runner for Recorder {
        fn kind(&self) -> RunnerKind {
            RunnerKind::Real
        }

        fn run(&self, cmd: &KubectlCommand) -> Result<Vec<u8>> {
            self.commands.borrow_mut().push(cmd.clone());
            match &self.fail_with {
                Some((stdout, stderr)) => Err(DmError::CommandFailed {
                    command: cmd.args().join(" "),
                    code: 1,
                    stdout: stdout.clone(),
                    stderr: stderr.clone(),
                }),
                None => Ok(b"created".to_vec()),
            }
        }
    }

    #[test]
    fn test_default_images() {
        let installer = Installer::new();
        assert_eq!(
            installer.image(Component::Manager),
            "gcr.io/kubernetes-helm/manager:latest"
        );
        assert_eq!(
            installer.image(Component::Resourcifier),
            "gcr.io/kubernetes-helm/resourcifier:latest"
        );
        assert_eq!(
            installer.image(Component::Expandybird),
            "gcr.io/kubernetes-helm/expandybird:latest"
        );
    }

    #[test]
    fn test_set_image_independent_slots() {
        let mut installer = Installer::new();
        installer
            .set_image(Component::Manager, "example.com/manager:v2")
            .set_image(Component::Expandybird, "");

        assert_eq!(installer.image(Component::Manager), "example.com/manager:v2");
        assert_eq!(
            installer.image(Component::Expandybird),
            Component::Expandybird.default_image()
        );
        assert_eq!(
            installer.image(Component::Resourcifier),
            Component::Resourcifier.default_image()
        );
    }

    #[test]
    fn test_empty_image_keeps_previous_override() {
        let mut installer = Installer::new();
        installer.set_image(Component::Resourcifier, "example.com/res:1");
        installer.set_image(Component::Resourcifier, "");
        assert_eq!(installer.image(Component::Resourcifier), "example.com/res:1");
    }

    #[test]
    fn test_install_creates_manifest() {
        let runner = Recorder::default();
        let mut installer = Installer::new();
        installer.set_image(Component::Manager, "example.com/manager:v2");

        let out = installer.install(&runner).unwrap();
        assert_eq!(out, "created");

        let commands = runner.commands.borrow();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].args(), ["create", "-f", "-"]);
        let stdin = String::from_utf8(commands[0].stdin().unwrap().to_vec()).unwrap();
        assert!(stdin.contains("example.com/manager:v2"));
        assert!(stdin.contains("gcr.io/kubernetes-helm/expandybird:latest"));
    }

    #[test]
    fn test_uninstall_deletes_namespace() {
        let runner = Recorder::default();
        uninstall(&runner).unwrap();

        let commands = runner.commands.borrow();
        assert_eq!(commands[0].args(), ["delete", "namespace", "dm"]);
    }

    #[test]
    fn test_uninstall_failure_keeps_partial_output() {
        let runner = Recorder {
            fail_with: Some(("partial".to_string(), "connection refused".to_string())),
            ..Default::default()
        };

        let err = uninstall(&runner).unwrap_err();
        assert_eq!(err.partial_output(), "partial");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_install_dry_run_echoes_command() {
        let out = Installer::new().install(&PrintRunner::default()).unwrap();
        assert!(out.starts_with("[CMD] kubectl create -f - < "));
        for component in Component::ALL {
            assert!(out.contains(&component.default_image()));
        }
    }
}
