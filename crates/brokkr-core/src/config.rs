//! Configuration file loading and parsing
//!
//! Brokkr reads an optional `config.yaml` from the platform config
//! directory. A missing file yields the defaults; a file that is
//! present but unparseable is a hard error.

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// Configuration file name inside the config directory
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Project registry file name inside the config directory
const REGISTRY_FILE_NAME: &str = "projects.yaml";

/// Default template archive URL
const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/brokkr-dev/templates/archive/refs/heads/main.zip";

/// Top-level brokkr configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokkrConfig {
    /// Default root directory for new projects
    pub project_dir: Utf8PathBuf,

    /// URL of the zip archive containing the template subtrees
    pub archive_url: String,

    /// Git workflow defaults
    pub git: GitWorkflowConfig,

    /// Named commands used by `project open`
    pub commands: CommandsConfig,
}

/// Git workflow defaults used by the repository publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitWorkflowConfig {
    pub default_branch: String,
    pub initial_commit_message: String,
    pub origin_remote: String,
    pub upstream_remote: String,
}

impl Default for GitWorkflowConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".to_string(),
            initial_commit_message: "Initial commit (brokkr)".to_string(),
            origin_remote: "origin".to_string(),
            upstream_remote: "upstream".to_string(),
        }
    }
}

/// Commands launched by `project open`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Command launching an IDE in the project directory
    pub ide: Option<String>,

    /// Command launching a terminal in the project directory
    pub terminal: Option<String>,
}

impl Default for BrokkrConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            git: GitWorkflowConfig::default(),
            commands: CommandsConfig::default(),
        }
    }
}

impl BrokkrConfig {
    /// Load the configuration from the platform config directory.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_dir()?.join(CONFIG_FILE_NAME);
        Self::load_from(&path)
    }

    /// Load the configuration from an explicit path (also used by tests)
    pub fn load_from(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config file at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_string(),
            source,
        })?;

        let config = serde_yaml_ng::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_string(),
            source,
        })?;

        debug!("loaded config from {}", path);
        Ok(config)
    }

    /// Platform config directory for brokkr, created on demand
    pub fn config_dir() -> Result<Utf8PathBuf> {
        let dirs = ProjectDirs::from("dev", "brokkr", "brokkr")
            .ok_or_else(|| Error::config_dir("no home directory available"))?;
        let dir = Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf())
            .map_err(|p| Error::config_dir(format!("config path is not UTF-8: {}", p.display())))?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Location of the persistent project registry
    pub fn registry_path() -> Result<Utf8PathBuf> {
        Ok(Self::config_dir()?.join(REGISTRY_FILE_NAME))
    }
}

fn default_project_dir() -> Utf8PathBuf {
    UserDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().to_path_buf()).ok())
        .map(|home| home.join("Projects"))
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}
