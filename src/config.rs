//! Configuration types and loading for refmatch

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level refmatch configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RefmatchConfig {
    /// Collaborator service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Behavioral defaults
    #[serde(default)]
    pub defaults: Defaults,
}

/// Where the collaborator services live
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL serving /split, /search/{id}, and /format
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport-level timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

/// Behavioral defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Ask the search collaborator for smarter (slower) matching
    #[serde(default)]
    pub use_smart_matching: bool,

    /// How long a successful reverify leaves the detail view open before
    /// edit mode closes, in milliseconds
    #[serde(default = "default_observation_delay_ms")]
    pub observation_delay_ms: u64,
}

fn default_observation_delay_ms() -> u64 {
    800
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            use_smart_matching: false,
            observation_delay_ms: default_observation_delay_ms(),
        }
    }
}

/// Partial config as read from a file; absent sections keep earlier values
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    service: Option<ServiceConfig>,
    defaults: Option<Defaults>,
}

impl RefmatchConfig {
    /// Load configuration from the standard hierarchy
    ///
    /// Load order (later overrides earlier):
    /// 1. Built-in defaults
    /// 2. ~/.config/refmatch/config.toml
    /// 3. refmatch.toml in the project directory
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                config.merge_file(&user_config_path)?;
            }
        }

        let project_path = project_dir
            .unwrap_or_else(|| Path::new("."))
            .join("refmatch.toml");
        if project_path.exists() {
            config.merge_file(&project_path)?;
        }

        Ok(config)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("refmatch").join("config.toml"))
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;

        if let Some(service) = file.service {
            self.service = service;
        }
        if let Some(defaults) = file.defaults {
            self.defaults = defaults;
        }
        tracing::debug!(path = %path.display(), "merged config file");
        Ok(())
    }
}
