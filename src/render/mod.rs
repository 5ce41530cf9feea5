//! Result rendering for querychat.
//!
//! [`render`] turns an execution outcome into [`RenderableContent`], a
//! presentation model independent of any output medium. The `html` and
//! `text` adapters turn that model into an HTML fragment or terminal lines.

pub mod html;
pub mod text;

use crate::error::ErrorReport;
use crate::model::{Outcome, QueryResult};

/// Indicator shown instead of a table when a query returns no rows.
pub const NO_RESULTS_TEXT: &str = "No results found";

/// Sandbox policy for visualization frames. Scripts may run, but without
/// `allow-same-origin` they run in an opaque origin.
pub const SANDBOX_POLICY: &str = "allow-scripts";

/// Content of a timeline message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableContent {
    /// Plain text, used for the user's own submissions.
    Text(String),
    /// A successful query result.
    Result(ResultView),
    /// A failed submission.
    Error(ErrorView),
}

/// A section that starts collapsed and can be expanded by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disclosure<T> {
    content: T,
    expanded: bool,
}

impl<T> Disclosure<T> {
    /// Wraps content in a collapsed disclosure.
    pub fn collapsed(content: T) -> Self {
        Self {
            content,
            expanded: false,
        }
    }

    /// Flips between expanded and collapsed.
    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn content(&self) -> &T {
        &self.content
    }
}

/// Backend markup kept as untrusted data.
///
/// Never inlined into the host document; adapters must isolate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedFrame {
    markup: String,
}

impl SandboxedFrame {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    /// The raw, unescaped markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// One entry of the diagnostic trail shown beneath a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailStep {
    pub title: String,
    pub detail: String,
}

impl TrailStep {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }
}

/// Tabular projection of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Either a table or the no-results indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultBody {
    Table(TableView),
    NoResults,
}

/// A rendered query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub summary: Option<String>,
    pub analysis: Option<String>,
    pub body: ResultBody,
    pub visualization: Option<SandboxedFrame>,
    pub trail: Option<Disclosure<Vec<TrailStep>>>,
}

/// A rendered error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub report: ErrorReport,
    pub attempts: Option<Disclosure<Vec<String>>>,
}

/// Renders an outcome with no diagnostic trail.
pub fn render(outcome: &Outcome) -> RenderableContent {
    render_with_trail(outcome, Vec::new())
}

/// Renders an outcome, attaching the trail to successful results.
pub fn render_with_trail(outcome: &Outcome, trail: Vec<TrailStep>) -> RenderableContent {
    match outcome {
        Ok(result) => RenderableContent::Result(render_result(result, trail)),
        Err(report) => RenderableContent::Error(render_error(report)),
    }
}

fn render_result(result: &QueryResult, trail: Vec<TrailStep>) -> ResultView {
    let body = if result.is_empty() {
        ResultBody::NoResults
    } else {
        ResultBody::Table(table_view(result))
    };

    ResultView {
        summary: result.summary.clone(),
        analysis: result.analysis.clone(),
        body,
        visualization: result
            .visualization_markup
            .as_ref()
            .map(|markup| SandboxedFrame::new(markup.clone())),
        trail: (!trail.is_empty()).then(|| Disclosure::collapsed(trail)),
    }
}

fn render_error(report: &ErrorReport) -> ErrorView {
    ErrorView {
        report: report.clone(),
        attempts: (!report.attempts.is_empty())
            .then(|| Disclosure::collapsed(report.attempts.clone())),
    }
}

/// Projects rows onto the first row's columns. Missing cells are empty and
/// keys absent from the first row are dropped.
pub fn table_view(result: &QueryResult) -> TableView {
    let columns: Vec<String> = result.columns().into_iter().map(String::from).collect();
    let rows = result
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(column).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    TableView { columns, rows }
}

/// Display text of a single cell.
pub fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
