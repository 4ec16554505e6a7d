//! Configuration management for beacon
//!
//! Config files are stored in platform-appropriate locations:
//! - Linux: ~/.config/beacon/
//! - macOS: ~/Library/Application Support/beacon/
//! - Windows: %APPDATA%\beacon\

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoDirFound,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay configuration (for beacon-server)
    #[serde(default)]
    pub server: ServerConfig,

    /// Dashboard client configuration (for beacon-tui)
    #[serde(default)]
    pub client: ClientConfig,

    /// Device agent configuration (for beacon-reporter)
    #[serde(default)]
    pub reporter: ReporterConfig,
}

/// Server-side configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Dashboard username
    #[serde(default = "default_username")]
    pub username: String,

    /// Dashboard password
    #[serde(default = "default_password")]
    pub password: String,

    /// Device state snapshot, loaded at startup and written at shutdown
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

/// Dashboard client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Relay base URL
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,
}

/// Device agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Whether the agent reports at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Reported device id (host name when unset)
    pub device_id: Option<String>,

    /// Seconds between reports
    #[serde(default = "default_report_interval")]
    pub interval_secs: u64,

    /// Fixed position for devices without a location source
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    crate::DEFAULT_PORT
}
fn default_username() -> String {
    "admin".to_string()
}
fn default_password() -> String {
    "admin".to_string()
}
fn default_state_file() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("beacon"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("devices.json")
}
fn default_server_url() -> String {
    format!("http://127.0.0.1:{}", crate::DEFAULT_PORT)
}
fn default_true() -> bool {
    true
}
fn default_report_interval() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            state_file: default_state_file(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_id: None,
            interval_secs: default_report_interval(),
            latitude: None,
            longitude: None,
        }
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join("beacon"))
            .ok_or(ConfigError::NoDirFound)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
