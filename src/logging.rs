//! Logging setup for querychat.
//!
//! The interactive REPL logs to a file so tracing output does not interleave
//! with the conversation; piped or scripted runs log to stderr.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::error::{QueryChatError, Result};

const LOG_DIR: &str = "querychat";
const LOG_FILE: &str = "querychat.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to the log file, truncating it on each run.
///
/// Location: `~/.local/state/querychat/querychat.log` on Linux, or the
/// platform-appropriate state/config directory elsewhere.
pub fn init_file_logging() -> Result<PathBuf> {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            QueryChatError::internal(format!(
                "could not create log directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let log_file = File::create(&log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .try_init()
        .map_err(|e| QueryChatError::internal(format!("logging already initialized: {e}")))?;

    Ok(log_path)
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| QueryChatError::internal(format!("logging already initialized: {e}")))
}

/// Returns the path for the log file.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join(LOG_DIR).join(LOG_FILE);
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join(LOG_DIR).join(LOG_FILE);
    }

    std::env::temp_dir().join(LOG_FILE)
}
