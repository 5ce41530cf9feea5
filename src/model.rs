//! Request and result types shared by the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorReport;

/// Chart kind used when a repaired hint has no original kind to keep.
pub const DEFAULT_VISUALIZATION_KIND: &str = "bar";

/// A result row: column name to JSON value, in backend column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Terminal outcome of an execution.
pub type Outcome = std::result::Result<QueryResult, ErrorReport>;

/// Visualization hint attached to a query.
///
/// Only a hint: the fields may not match the columns the query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_field: Option<String>,
}

impl VisualizationSpec {
    /// Creates a hint of the given kind with no field selection.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            x_field: None,
            y_field: None,
        }
    }

    /// Sets the x and y fields.
    pub fn with_fields(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_field = Some(x.into());
        self.y_field = Some(y.into());
        self
    }
}

/// Returned when a query would be built from empty SQL.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("query text is empty")]
pub struct EmptyQuery;

/// A vetted query ready for execution.
///
/// The SQL is never empty and cannot be changed after construction. A
/// different hint means a different request, see [`QueryRequest::with_hint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    sql: String,
    visualization_hint: Option<VisualizationSpec>,
}

impl QueryRequest {
    /// Creates a request without a visualization hint.
    pub fn new(sql: impl Into<String>) -> Result<Self, EmptyQuery> {
        let sql = sql.into();
        if sql.trim().is_empty() {
            return Err(EmptyQuery);
        }
        Ok(Self {
            sql,
            visualization_hint: None,
        })
    }

    /// Returns a new request with the same SQL and the given hint.
    pub fn with_hint(&self, hint: Option<VisualizationSpec>) -> Self {
        Self {
            sql: self.sql.clone(),
            visualization_hint: hint,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn visualization_hint(&self) -> Option<&VisualizationSpec> {
        self.visualization_hint.as_ref()
    }
}

/// A successful execution result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Result rows in backend order.
    #[serde(default)]
    pub rows: Vec<Row>,

    /// Backend-generated visualization markup. Untrusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_markup: Option<String>,

    /// Optional short summary of the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Optional longer analysis, shown beneath the summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

impl QueryResult {
    /// Creates a result with the given rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first row, in order.
    pub fn columns(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
