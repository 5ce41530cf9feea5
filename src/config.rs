//! Configuration management for querychat.
//!
//! Handles loading configuration from a TOML file and environment variables.
//! Precedence is CLI flags, then the config file, then environment defaults.

use crate::error::{QueryChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable overriding the backend base URL.
pub const ENV_BACKEND_URL: &str = "QUERYCHAT_BACKEND_URL";

/// Environment variable overriding the request timeout.
pub const ENV_TIMEOUT_SECS: &str = "QUERYCHAT_TIMEOUT_SECS";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Translation/execution backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Terminal rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL the endpoint paths are joined to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Parses the base URL, appending a trailing slash so endpoint paths
    /// join below it instead of replacing its last segment.
    pub fn parsed_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            QueryChatError::config(format!("Invalid backend URL '{}': {e}", self.base_url))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(QueryChatError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    /// Applies environment variables where the config still holds defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.base_url == default_base_url() {
            if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
                self.base_url = url;
            }
        }
        if self.timeout_secs == default_timeout_secs() {
            if let Some(secs) = std::env::var(ENV_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
            {
                self.timeout_secs = secs;
            }
        }
    }
}

/// Terminal rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderConfig {
    /// Maximum width of a table column in the terminal.
    #[serde(default = "default_max_column_width")]
    pub max_column_width: usize,
}

fn default_max_column_width() -> usize {
    40
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_column_width: default_max_column_width(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querychat")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryChatError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            QueryChatError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;

        if config.backend.timeout_secs == 0 {
            return Err(QueryChatError::config(
                "backend.timeout_secs must be greater than zero",
            ));
        }

        Ok(config)
    }
}
