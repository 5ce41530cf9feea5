//! Error types for querychat.
//!
//! Two layers live here: [`ErrorReport`], the user-facing outcome of a failed
//! translation or execution, and [`QueryChatError`], the application-level
//! error used by configuration, logging and the CLI host.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failed pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend rejected the natural-language input.
    Translation,
    /// The backend rejected the query.
    Execution,
    /// The query ran but the requested visualization fields were invalid.
    Visualization,
    /// Transport failure, timeout, or an unreadable backend response.
    Network,
}

impl ErrorKind {
    /// Returns the kind as a display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Translation => "Translation",
            Self::Execution => "Execution",
            Self::Visualization => "Visualization",
            Self::Network => "Network",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A failed outcome as shown to the user.
///
/// `attempts` is the backend's diagnostic trail, kept verbatim and in order.
/// It is empty when the backend supplied none.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default)]
    pub attempts: Vec<String>,
}

impl ErrorReport {
    /// Creates a report with no attempts trail.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts: Vec::new(),
        }
    }

    /// Attaches the backend's attempts trail.
    pub fn with_attempts(mut self, attempts: Vec<String>) -> Self {
        self.attempts = attempts;
        self
    }

    /// Creates a translation error.
    pub fn translation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Translation, message)
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }

    /// Creates a visualization error.
    pub fn visualization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Visualization, message)
    }

    /// Creates a network error. Network errors never carry attempts.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum QueryChatError {
    /// Configuration errors (invalid config file, bad backend URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend client setup errors.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Terminal or file I/O errors in the host.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryChatError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a backend error with the given message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Backend(_) => "Backend Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using QueryChatError.
pub type Result<T> = std::result::Result<T, QueryChatError>;
