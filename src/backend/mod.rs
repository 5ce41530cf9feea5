//! Backend abstraction for querychat.
//!
//! The backend exposes two opaque remote procedures, translation and
//! execution. This module defines the trait the pipeline depends on, the
//! replies it returns, and the transport failures that can occur.

mod http;
mod mock;
pub mod wire;

pub use http::HttpBackend;
pub use mock::MockBackend;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{QueryRequest, QueryResult, Row, VisualizationSpec};

/// Backend path for natural-language translation.
pub const TRANSLATE_PATH: &str = "translate_to_sql";

/// Backend path for query execution.
pub const EXECUTE_PATH: &str = "execute_query";

/// Reply of the translation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateReply {
    /// The text was translated into a query.
    Translated {
        query: String,
        visualization_hint: Option<VisualizationSpec>,
    },
    /// The backend refused to translate the text.
    Rejected {
        error: String,
        attempts: Vec<String>,
    },
}

/// Reply of the execution endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteReply {
    /// The query ran.
    Rows(QueryResult),
    /// The backend reported an error, possibly with rows it produced first.
    Rejected {
        error: String,
        attempts: Vec<String>,
        partial_rows: Vec<Row>,
    },
}

/// Failure to obtain a reply at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("could not connect to backend: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

/// Trait implemented by backend clients.
///
/// Implementations must be thread-safe (Send + Sync); submissions share one
/// client across tasks.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Sends natural-language text to the translation endpoint.
    async fn translate(&self, text: &str) -> Result<TranslateReply, TransportError>;

    /// Sends a query to the execution endpoint.
    async fn execute(&self, request: &QueryRequest) -> Result<ExecuteReply, TransportError>;
}
