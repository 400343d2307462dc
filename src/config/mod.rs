//! Global configuration for tutils.
//!
//! Settings live in a small TOML file, by default `~/.tutils/config.toml`
//! (`%LOCALAPPDATA%\tutils\config.toml` on Windows). The path can be changed with
//! `--config` or the `TUTILS_CONFIG` environment variable. A missing file means
//! "all defaults".
//!
//! ```toml
//! data_dir = "~/.tutils"
//! release_owner = "XXanderWP"
//! release_repo = "TerminalUtils"
//! update_ttl_secs = 300
//! background_update_check = true
//! ```
//!
//! The data directory holds the files every helper shares:
//!
//! | File | Owner |
//! |------|-------|
//! | `servers.txt` | SSH server manager |
//! | `repos.json` | pull request helper |
//! | `.update_cache.json` | update check cache |
//! | `.update_available.json` | update flag file |
//!
//! `TUTILS_HOME` overrides `data_dir` without editing the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::utils::platform::{get_home_dir, resolve_path};

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "TUTILS_HOME";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "TUTILS_CONFIG";

pub const SERVERS_FILE: &str = "servers.txt";
pub const REPOS_FILE: &str = "repos.json";
pub const UPDATE_CACHE_FILE: &str = ".update_cache.json";
pub const UPDATE_FLAG_FILE: &str = ".update_available.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Where servers.txt, repos.json and the update files live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// GitHub owner queried for new releases.
    #[serde(default = "default_release_owner")]
    pub release_owner: String,

    /// GitHub repository queried for new releases.
    #[serde(default = "default_release_repo")]
    pub release_repo: String,

    /// How long a cached release lookup stays fresh, in seconds.
    #[serde(default = "default_update_ttl")]
    pub update_ttl_secs: u64,

    /// Whether helpers run the silent update check on startup.
    #[serde(default = "default_true")]
    pub background_update_check: bool,
}

fn default_release_owner() -> String {
    "XXanderWP".to_string()
}

fn default_release_repo() -> String {
    "TerminalUtils".to_string()
}

const fn default_update_ttl() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            release_owner: default_release_owner(),
            release_repo: default_release_repo(),
            update_ttl_secs: default_update_ttl(),
            background_update_check: true,
        }
    }
}

/// Resolved locations of the shared data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub servers: PathBuf,
    pub repos: PathBuf,
    pub update_cache: PathBuf,
    pub update_flag: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            servers: root.join(SERVERS_FILE),
            repos: root.join(REPOS_FILE),
            update_cache: root.join(UPDATE_CACHE_FILE),
            update_flag: root.join(UPDATE_FLAG_FILE),
            root,
        }
    }
}

impl ToolConfig {
    /// Load from `path`, or from [`default_path`](Self::default_path) when `None`.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Platform default config file location.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_dir()?.join("config.toml"))
    }

    fn default_dir() -> Result<PathBuf> {
        if cfg!(target_os = "windows") {
            Ok(dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("tutils"))
        } else {
            Ok(get_home_dir()?.join(".tutils"))
        }
    }

    /// The data directory: `TUTILS_HOME`, then `data_dir`, then the default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match std::env::var(HOME_ENV) {
            Ok(home) if !home.is_empty() => return resolve_path(&home),
            _ => {}
        }
        match &self.data_dir {
            Some(dir) => resolve_path(dir),
            None => Self::default_dir(),
        }
    }

    pub fn paths(&self) -> Result<DataPaths> {
        Ok(DataPaths::new(self.data_dir()?))
    }
}
