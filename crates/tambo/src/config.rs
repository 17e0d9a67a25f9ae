//! Configuration paths for tambo.
//!
//! Everything lives under one home directory (`~/.tambo` by default):
//!
//! ```text
//! ~/.tambo/
//!   config.toml      optional
//!   tambo.sqlite3    survey database
//!   logs/            daily rolling log files
//! ```
//!
//! Resolution priority: command-line flags, then `TAMBO_HOME` / `TAMBO_DB`,
//! then `config.toml`, then defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "TAMBO_HOME";
pub const DB_ENV: &str = "TAMBO_DB";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DB_FILE: &str = "tambo.sqlite3";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DatabaseSection {
    /// Relative paths are taken from the home directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoggingSection {
    pub filter: Option<String>,
}

impl ConfigFile {
    /// Load `config.toml`; a missing file is an empty config.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse config file {}: {}. Delete this file to reset.",
                path.display(),
                e
            )
        })
    }
}

/// Values that override the config file, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub home_flag: Option<PathBuf>,
    pub db_flag: Option<PathBuf>,
    pub home_env: Option<PathBuf>,
    pub db_env: Option<PathBuf>,
}

impl Overrides {
    /// Flags plus the process environment.
    pub fn from_env(home_flag: Option<PathBuf>, db_flag: Option<PathBuf>) -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            home_flag,
            db_flag,
            home_env: var(HOME_ENV),
            db_env: var(DB_ENV),
        }
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TamboConfig {
    pub home: PathBuf,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_filter: Option<String>,
    /// Whether `config.toml` was found
    pub config_file: Option<PathBuf>,
}

impl TamboConfig {
    pub fn load(overrides: &Overrides) -> anyhow::Result<Self> {
        let home = overrides
            .home_flag
            .clone()
            .or_else(|| overrides.home_env.clone())
            .unwrap_or_else(default_home);

        let config_path = home.join(CONFIG_FILE);
        let file = ConfigFile::load(&config_path)?;
        let config_file = config_path.exists().then_some(config_path);

        let database_path = overrides
            .db_flag
            .clone()
            .or_else(|| overrides.db_env.clone())
            .or_else(|| file.database.path.map(|p| home.join(p)))
            .unwrap_or_else(|| home.join(DEFAULT_DB_FILE));

        Ok(Self {
            log_dir: home.join("logs"),
            home,
            database_path,
            log_filter: file.logging.filter,
            config_file,
        })
    }
}

/// `~/.tambo`, or `./.tambo` when there is no home directory.
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tambo")
}
