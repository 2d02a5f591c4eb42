//! Configuration loading
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The resolved [`GovernanceConfig`] is constructed once at startup and passed
//! into the application state; nothing reads configuration from globals.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the SQLite database file
pub const ENV_DATABASE_PATH: &str = "AGA_DATABASE_PATH";
/// Environment variable holding the webhook shared secret
pub const ENV_WEBHOOK_SECRET: &str = "AGA_WEBHOOK_SECRET";
/// Environment variable overriding the HTTP bind address
pub const ENV_BIND_ADDRESS: &str = "AGA_BIND_ADDRESS";
/// Environment variable overriding the log filter
pub const ENV_LOG_FILTER: &str = "AGA_LOG";

/// Compiled default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";
/// Compiled default log filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub webhook_secret: Option<String>,
    pub bind_address: Option<String>,
    pub log_filter: Option<String>,
    /// Explicit TOML file; when set, a missing file is an error
    pub config_file: Option<PathBuf>,
}

/// On-disk TOML configuration. All keys are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

/// Resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GovernanceConfig {
    /// SQLite database file; `None` leaves the store unconfigured
    pub database_path: Option<PathBuf>,
    /// Shared secret for inbound webhook signatures; `None` rejects all webhooks
    pub webhook_secret: Option<String>,
    pub bind_address: String,
    pub log_filter: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            webhook_secret: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl GovernanceConfig {
    /// Resolve configuration from CLI overrides, the process environment and
    /// the TOML file.
    ///
    /// A missing default TOML file is not an error: the service starts with
    /// environment values and compiled defaults.
    pub fn resolve(cli: &ConfigOverrides) -> Result<Self> {
        let toml_config = match &cli.config_file {
            Some(path) => load_toml_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_toml_config(&path)?,
                Some(path) => {
                    info!("No config file at {}, using environment and defaults", path.display());
                    TomlConfig::default()
                }
                None => {
                    warn!("Could not determine config directory, using environment and defaults");
                    TomlConfig::default()
                }
            },
        };

        Ok(Self::from_sources(cli, |key| std::env::var(key).ok(), toml_config))
    }

    /// Merge the three configuration tiers. `env` looks up an environment
    /// variable by name.
    pub fn from_sources<F>(cli: &ConfigOverrides, env: F, toml_config: TomlConfig) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = cli
            .database_path
            .clone()
            .or_else(|| env(ENV_DATABASE_PATH).map(PathBuf::from))
            .or(toml_config.database_path);

        let webhook_secret = cli
            .webhook_secret
            .clone()
            .or_else(|| env(ENV_WEBHOOK_SECRET))
            .or(toml_config.webhook_secret)
            .filter(|secret| !secret.is_empty());

        let bind_address = cli
            .bind_address
            .clone()
            .or_else(|| env(ENV_BIND_ADDRESS))
            .or(toml_config.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let log_filter = cli
            .log_filter
            .clone()
            .or_else(|| env(ENV_LOG_FILTER))
            .or(toml_config.log_filter)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            database_path,
            webhook_secret,
            bind_address,
            log_filter,
        }
    }

    /// Webhook secret, if one is configured
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }
}

/// Default configuration file path for the platform
/// (`~/.config/aga/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aga").join("config.toml"))
}

/// Load and parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}
