//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ORGMIG_ROOT_FOLDER";

/// Environment variable carrying the source API token
pub const SOURCE_API_TOKEN_ENV: &str = "ORGMIG_SOURCE_API_TOKEN";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "orgmig.db";

/// Per-task progress logs live in this folder under the root folder
pub const MIGRATION_LOG_DIR: &str = "migration_logs";

/// Throughput quota given to every imported channel unless configured
pub const DEFAULT_TPS: i64 = 10;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5741";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_REQUESTED_BY: &str = "migrator";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub source_base_url: Option<String>,
    pub source_api_token: Option<String>,
    pub default_tps: Option<i64>,
    pub requested_by: Option<String>,
}

impl TomlConfig {
    /// Parse a config file. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load the platform config file, falling back to defaults when none exists
    pub fn load_or_default() -> Self {
        let path = match config_file_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("{}; using built-in defaults", e);
                return Self::default();
            }
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using built-in defaults", e);
                Self::default()
            }
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    pub fn default_tps(&self) -> i64 {
        self.default_tps.unwrap_or(DEFAULT_TPS)
    }

    pub fn requested_by(&self) -> &str {
        self.requested_by.as_deref().unwrap_or(DEFAULT_REQUESTED_BY)
    }

    /// Source API token: environment beats TOML
    pub fn source_api_token(&self) -> Option<String> {
        std::env::var(SOURCE_API_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.source_api_token.clone())
    }
}

/// Get configuration file path for the platform
pub fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("orgmig").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/orgmig/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("orgmig"))
        .unwrap_or_else(|| PathBuf::from("./orgmig_data"))
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `ORGMIG_ROOT_FOLDER`
/// 3. TOML `root_folder`
/// 4. OS-dependent default
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    pub fn with_toml(mut self, toml: TomlConfig) -> Self {
        self.toml = Some(toml);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = self.toml.as_ref().and_then(|t| t.root_folder.clone()) {
            return path;
        }

        default_root_folder()
    }
}

/// Creates the root folder layout on first run
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        std::fs::create_dir_all(self.migration_log_dir())?;
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn migration_log_dir(&self) -> PathBuf {
        self.root_folder.join(MIGRATION_LOG_DIR)
    }
}
