//! Core orchestrator for querychat.
//!
//! Routes each submission through translation, confirmation and execution,
//! and records the user's input and the rendered outcome on the timeline.
//! Submissions run as independent tasks; their replies may interleave.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::confirm::ConfirmationGate;
use crate::error::{ErrorKind, QueryChatError, Result};
use crate::model::{Outcome, QueryRequest, VisualizationSpec};
use crate::query::QueryExecutor;
use crate::render::{render_with_trail, RenderableContent, TrailStep};
use crate::timeline::{Role, Timeline};
use crate::translate::TranslationClient;

/// Unique identifier for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(u64);

impl SubmissionId {
    /// Generates a new unique submission ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a submission's text is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Executed as written, without confirmation.
    LiteralSql,
    /// Translated to SQL, then confirmed by the user.
    NaturalLanguage,
}

/// Classifies trimmed input. Anything starting with `SELECT`, in any case,
/// is literal SQL.
pub fn classify_input(text: &str) -> InputKind {
    if text.trim_start().to_uppercase().starts_with("SELECT") {
        InputKind::LiteralSql
    } else {
        InputKind::NaturalLanguage
    }
}

/// Terminal state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A result was appended.
    Completed,
    /// An error of the given kind was appended.
    Failed(ErrorKind),
    /// The user declined the generated query. Nothing was appended.
    Declined,
}

/// Handle to a running submission.
#[derive(Debug)]
pub struct Submission {
    id: SubmissionId,
    kind: InputKind,
    handle: JoinHandle<SubmissionOutcome>,
}

impl Submission {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Natural-language submissions ask for confirmation before executing.
    pub fn kind(&self) -> InputKind {
        self.kind
    }

    /// Waits for the submission to finish.
    pub async fn outcome(self) -> Result<SubmissionOutcome> {
        self.handle
            .await
            .map_err(|e| QueryChatError::internal(format!("submission {} failed: {e}", self.id)))
    }
}

enum Plan {
    Direct(QueryRequest),
    Translate(String),
}

struct Pipeline {
    translator: TranslationClient,
    executor: QueryExecutor,
    gate: Arc<dyn ConfirmationGate>,
    timeline: Timeline,
}

/// Entry point for user submissions.
#[derive(Clone)]
pub struct Orchestrator {
    pipeline: Arc<Pipeline>,
}

impl Orchestrator {
    /// Creates an orchestrator whose translator and executor share `backend`.
    pub fn new(
        backend: Arc<dyn BackendClient>,
        gate: Arc<dyn ConfirmationGate>,
        timeline: Timeline,
    ) -> Self {
        Self::from_parts(
            TranslationClient::new(backend.clone()),
            QueryExecutor::new(backend),
            gate,
            timeline,
        )
    }

    pub fn from_parts(
        translator: TranslationClient,
        executor: QueryExecutor,
        gate: Arc<dyn ConfirmationGate>,
        timeline: Timeline,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                translator,
                executor,
                gate,
                timeline,
            }),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.pipeline.timeline
    }

    /// Submits user text.
    ///
    /// Empty input is ignored and returns `None`. Otherwise the user's
    /// message is on the timeline when this returns, and the rest of the
    /// pipeline runs on a spawned task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn submit(&self, text: &str) -> Option<Submission> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let kind = classify_input(text);
        let plan = match kind {
            InputKind::LiteralSql => Plan::Direct(QueryRequest::new(text).ok()?),
            InputKind::NaturalLanguage => Plan::Translate(text.to_string()),
        };

        let id = SubmissionId::new();
        info!(%id, ?kind, "Submission received");
        self.pipeline
            .timeline
            .append(Role::User, RenderableContent::Text(text.to_string()));

        let pipeline = Arc::clone(&self.pipeline);
        let handle = tokio::spawn(async move { pipeline.run(id, plan).await });

        Some(Submission { id, kind, handle })
    }
}

impl Pipeline {
    async fn run(&self, id: SubmissionId, plan: Plan) -> SubmissionOutcome {
        let (request, mut trail) = match plan {
            Plan::Direct(request) => {
                let trail = vec![TrailStep::new("Direct SQL query", request.sql())];
                (request, trail)
            }
            Plan::Translate(text) => {
                let request = match self.translator.translate(&text).await {
                    Ok(request) => request,
                    Err(report) => return self.finish(id, Err(report), Vec::new()),
                };

                let mut trail = vec![TrailStep::new("SQL generation", request.sql())];
                if let Some(hint) = request.visualization_hint() {
                    trail.push(TrailStep::new("Visualization hint", describe_hint(hint)));
                }

                if !self.gate.confirm(request.sql()).await {
                    info!(%id, "Generated query declined");
                    return SubmissionOutcome::Declined;
                }
                (request, trail)
            }
        };

        let outcome = self
            .executor
            .execute_detailed(&request)
            .await
            .map(|executed| {
                if let Some(hint) = &executed.repaired_hint {
                    trail.push(TrailStep::new("Visualization repair", describe_hint(hint)));
                }
                debug!(%id, elapsed_ms = executed.execution_time.as_millis() as u64, "Executed");
                executed.result
            });

        self.finish(id, outcome, trail)
    }

    fn finish(
        &self,
        id: SubmissionId,
        outcome: Outcome,
        trail: Vec<TrailStep>,
    ) -> SubmissionOutcome {
        let status = match &outcome {
            Ok(_) => SubmissionOutcome::Completed,
            Err(report) => {
                warn!(%id, kind = %report.kind, "Submission failed: {}", report.message);
                SubmissionOutcome::Failed(report.kind)
            }
        };
        self.timeline.append(Role::Assistant, render_with_trail(&outcome, trail));
        status
    }
}

fn describe_hint(hint: &VisualizationSpec) -> String {
    serde_json::to_string(hint).unwrap_or_else(|_| hint.kind.clone())
}
