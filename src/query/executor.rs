//! Query execution with a single visualization repair.
//!
//! An execution is at most two backend calls. The first attempt runs the
//! request as given. If the backend rejects only the visualization fields
//! and returned rows to derive new ones from, one repair attempt runs with a
//! corrected hint. Nothing else is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::{BackendClient, ExecuteReply};
use crate::error::{ErrorKind, ErrorReport};
use crate::model::{
    Outcome, QueryRequest, QueryResult, Row, VisualizationSpec, DEFAULT_VISUALIZATION_KIND,
};

/// Marker the backend puts in an error message when the hinted x/y fields
/// do not exist in the result.
pub const VISUALIZATION_ERROR_MARKER: &str = "VISUALIZATION_COLUMN_ERROR";

/// Executes queries against the backend.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn BackendClient>,
}

/// Successful execution with details for the diagnostic trail.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// The query result.
    pub result: QueryResult,
    /// The hint the repair attempt used, if the first attempt was repaired.
    pub repaired_hint: Option<VisualizationSpec>,
    /// Wall time across all attempts.
    pub execution_time: Duration,
}

/// A failed attempt along with any rows the backend produced before failing.
#[derive(Debug)]
struct AttemptFailure {
    report: ErrorReport,
    partial_rows: Vec<Row>,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    /// Executes a request and returns its terminal outcome.
    pub async fn execute(&self, request: &QueryRequest) -> Outcome {
        self.execute_detailed(request).await.map(|outcome| outcome.result)
    }

    /// Like [`execute`](Self::execute), but reports whether the
    /// visualization hint had to be repaired.
    pub async fn execute_detailed(
        &self,
        request: &QueryRequest,
    ) -> Result<QueryOutcome, ErrorReport> {
        let start = Instant::now();

        let failure = match self.attempt(request).await {
            Ok(result) => {
                return Ok(QueryOutcome {
                    result,
                    repaired_hint: None,
                    execution_time: start.elapsed(),
                })
            }
            Err(failure) => failure,
        };

        let Some(hint) = repair_target(&failure, request) else {
            return Err(failure.report);
        };

        info!(
            x = hint.x_field.as_deref().unwrap_or_default(),
            y = hint.y_field.as_deref().unwrap_or_default(),
            "Retrying with repaired visualization hint"
        );
        let repaired = request.with_hint(Some(hint.clone()));

        match self.attempt(&repaired).await {
            Ok(result) => Ok(QueryOutcome {
                result,
                repaired_hint: Some(hint),
                execution_time: start.elapsed(),
            }),
            Err(retry) => {
                warn!(error = %retry.report, "Visualization repair failed");
                Err(failure.report)
            }
        }
    }

    async fn attempt(&self, request: &QueryRequest) -> Result<QueryResult, AttemptFailure> {
        debug!(
            sql = %request.sql(),
            hinted = request.visualization_hint().is_some(),
            "Executing query"
        );

        let reply = self
            .backend
            .execute(request)
            .await
            .map_err(|e| AttemptFailure {
                report: ErrorReport::network(e.to_string()),
                partial_rows: Vec::new(),
            })?;

        match reply {
            ExecuteReply::Rows(result) => {
                debug!(rows = result.rows.len(), "Query succeeded");
                Ok(result)
            }
            ExecuteReply::Rejected {
                error,
                attempts,
                partial_rows,
            } => Err(AttemptFailure {
                report: ErrorReport::new(classify_error(&error), error).with_attempts(attempts),
                partial_rows,
            }),
        }
    }
}

/// Classifies a backend execution error message.
pub fn classify_error(message: &str) -> ErrorKind {
    if message.to_uppercase().contains(VISUALIZATION_ERROR_MARKER) {
        ErrorKind::Visualization
    } else {
        ErrorKind::Execution
    }
}

fn repair_target(failure: &AttemptFailure, request: &QueryRequest) -> Option<VisualizationSpec> {
    if failure.report.kind != ErrorKind::Visualization {
        return None;
    }
    let hint = repair_hint(&failure.partial_rows, request.visualization_hint());
    if hint.is_none() {
        debug!("Visualization error without usable rows, not retrying");
    }
    hint
}

/// Derives a hint from the first row's columns: the first becomes the x
/// field and the second the y field. Keeps the original kind, or falls back
/// to [`DEFAULT_VISUALIZATION_KIND`].
///
/// Returns `None` when there is no row or it has fewer than two columns.
pub fn repair_hint(
    rows: &[Row],
    original: Option<&VisualizationSpec>,
) -> Option<VisualizationSpec> {
    let mut columns = rows.first()?.keys();
    let x = columns.next()?;
    let y = columns.next()?;

    let kind = original
        .map(|hint| hint.kind.clone())
        .unwrap_or_else(|| DEFAULT_VISUALIZATION_KIND.to_string());

    Some(VisualizationSpec::new(kind).with_fields(x.as_str(), y.as_str()))
}
