use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::dm::Component;
use crate::error::{DmError, Result};
use crate::kubectl::KubectlSettings;

/// Environment variable pointing at an alternate settings file
pub const CONFIG_ENV: &str = "HELM_CONFIG";

/// Environment variable that opts `dm status` into reporting its errors
pub const REPORT_STATUS_ERRORS_ENV: &str = "HELM_REPORT_STATUS_ERRORS";

/// Settings from ~/.helm/config.toml
///
/// Every section is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub kubectl: KubectlSettings,
    pub images: ImageDefaults,
    pub status: StatusSettings,
}

/// Config-file image defaults, below flags and environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resourcifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expandybird: Option<String>,
}

impl ImageDefaults {
    pub fn get(&self, component: Component) -> Option<&str> {
        match component {
            Component::Manager => self.manager.as_deref(),
            Component::Resourcifier => self.resourcifier.as_deref(),
            Component::Expandybird => self.expandybird.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSettings {
    /// Print the cause when `dm status` fails (silent by default)
    pub report_errors: bool,
}

impl Settings {
    /// Load settings from the default location, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path())?;
        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from `path`; a missing file is not an error
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| DmError::config(path, e.to_string()))?;

        toml::from_str(&content).map_err(|e| DmError::config(path, e.to_string()))
    }

    /// Get config file path: $HELM_CONFIG or ~/.helm/config.toml
    pub fn config_path() -> PathBuf {
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".helm/config.toml")
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(REPORT_STATUS_ERRORS_ENV) {
            self.status.report_errors = parse_flag(&value);
        }
    }

    /// Serialize settings back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DmError::config(Self::config_path(), e.to_string()))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
