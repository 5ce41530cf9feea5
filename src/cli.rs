//! Command-line argument parsing for querychat.

use crate::config::Config;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Ask questions about your data in plain language or SQL.
#[derive(Parser, Debug)]
#[command(name = "querychat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and QUERYCHAT_BACKEND_URL)
    #[arg(long, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Request timeout in seconds (overrides config and QUERYCHAT_TIMEOUT_SECS)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Write an HTML transcript of the session to this path on exit
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long, env = "QUERYCHAT_LOG_STDERR")]
    pub log_stderr: bool,

    /// Use the in-process mock backend (offline, for testing)
    #[arg(long)]
    pub mock_backend: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Loads the config file, fills defaults from the environment, then
    /// applies flag overrides.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load_from_file(&self.config_path())?;
        config.backend.apply_env_defaults();
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.backend.timeout_secs = timeout;
        }
    }
}
