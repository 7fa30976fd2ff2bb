//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/totalrecall/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/totalrecall/` (~/.config/totalrecall/)
//! - State/Logs: `$XDG_STATE_HOME/totalrecall/` (~/.local/state/totalrecall/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Where to look for the Recall store
    #[serde(default)]
    pub source: SourceConfig,

    /// Where to put the extraction folder
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Report rendering options
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source store lookup
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Directory holding per-user profiles
    #[serde(default = "default_users_root")]
    pub users_root: PathBuf,

    /// Explicit base path, bypassing username derivation
    pub base_path: Option<PathBuf>,

    /// Sort candidate GUID folders by name instead of using listing order
    #[serde(default)]
    pub sort_subfolders: bool,

    /// Run `icacls` on the base path before resolving it (Windows only)
    #[serde(default = "default_grant_permissions")]
    pub grant_permissions: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            users_root: default_users_root(),
            base_path: None,
            sort_subfolders: false,
            grant_permissions: default_grant_permissions(),
        }
    }
}

fn default_users_root() -> PathBuf {
    PathBuf::from(r"C:\Users")
}

fn default_grant_permissions() -> bool {
    true
}

/// Extraction output
#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Parent directory for timestamp-named extraction folders
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Timezone used to render capture timestamps.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportTimezone {
    #[default]
    Utc,
    Local,
}

/// Report rendering options
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    #[serde(default)]
    pub timezone: ReportTimezone,

    /// Order rows by timestamp (then rowid) instead of table order
    #[serde(default)]
    pub order_by_timestamp: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/totalrecall/config.toml` (~/.config/totalrecall/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("totalrecall").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/totalrecall/` (~/.local/state/totalrecall/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("totalrecall")
    }
}
