//! End-to-end submissions through the orchestrator.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use querychat::backend::{BackendClient, HttpBackend, MockBackend};
use querychat::config::BackendConfig;
use querychat::confirm::{ChannelConfirmationGate, ConfirmationRequest};
use querychat::error::ErrorKind;
use querychat::orchestrator::{Orchestrator, SubmissionOutcome};
use querychat::render::{html, text, RenderableContent, ResultBody, TableView, NO_RESULTS_TEXT};
use querychat::timeline::{Role, Timeline};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use super::stub_server::{StubReply, StubServer};

/// Answers every confirmation the same way and returns the SQL it was asked.
fn answer_all(
    mut requests: UnboundedReceiver<ConfirmationRequest>,
    approve: bool,
) -> JoinHandle<Vec<String>> {
    tokio::spawn(async move {
        let mut asked = Vec::new();
        while let Some(request) = requests.recv().await {
            asked.push(request.sql().to_string());
            if approve {
                request.approve();
            } else {
                request.decline();
            }
        }
        asked
    })
}

fn setup(
    backend: Arc<dyn BackendClient>,
    approve: bool,
) -> (Orchestrator, JoinHandle<Vec<String>>) {
    let (gate, requests) = ChannelConfirmationGate::new();
    let orchestrator = Orchestrator::new(backend, Arc::new(gate), Timeline::new());
    (orchestrator, answer_all(requests, approve))
}

fn http_backend(server: &StubServer) -> Arc<dyn BackendClient> {
    Arc::new(
        HttpBackend::new(&BackendConfig {
            base_url: server.base_url().to_string(),
            timeout_secs: 5,
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_literal_sql_appends_user_then_result() {
    let server = StubServer::start(vec![StubReply::Json(
        200,
        json!({"rows": [{"name": "x", "count": 3}]}),
    )])
    .await;
    let (orchestrator, _) = setup(http_backend(&server), false);

    let outcome = orchestrator
        .submit("SELECT name, count FROM t")
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::Completed);

    let messages = orchestrator.timeline().all();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role(), Role::User);
    assert_eq!(messages[1].role(), Role::Assistant);
    match messages[1].content() {
        RenderableContent::Result(view) => assert_eq!(
            view.body,
            ResultBody::Table(TableView {
                columns: vec!["name".to_string(), "count".to_string()],
                rows: vec![vec!["x".to_string(), "3".to_string()]],
            })
        ),
        other => panic!("expected result, got {other:?}"),
    }

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, json!({"query": "SELECT name, count FROM t"}));
}

#[tokio::test]
async fn test_empty_rows_render_no_results() {
    let server = StubServer::start(vec![StubReply::Json(200, json!({"rows": []}))]).await;
    let (orchestrator, _) = setup(http_backend(&server), false);

    orchestrator
        .submit("SELECT * FROM empty")
        .unwrap()
        .outcome()
        .await
        .unwrap();

    let latest = orchestrator.timeline().latest().unwrap();
    let lines = text::lines(latest.content(), 40);
    assert!(lines.contains(&NO_RESULTS_TEXT.to_string()));
    assert!(!html::fragment(latest.content()).contains("<table"));
}

#[tokio::test]
async fn test_translated_query_runs_after_approval() {
    let server = StubServer::start(vec![
        StubReply::Json(
            200,
            json!({
                "query": "SELECT region, SUM(amount) FROM sales GROUP BY region",
                "visualizationHint": {"kind": "pie", "xField": "region", "yField": "sum"}
            }),
        ),
        StubReply::Json(200, json!({"rows": [{"region": "north", "sum": 10}]})),
    ])
    .await;
    let (orchestrator, answers) = setup(http_backend(&server), true);

    let outcome = orchestrator
        .submit("sales by region")
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::Completed);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, json!({"message": "sales by region"}));
    assert_eq!(
        requests[1].body,
        json!({
            "query": "SELECT region, SUM(amount) FROM sales GROUP BY region",
            "visualizationHint": {"kind": "pie", "xField": "region", "yField": "sum"}
        })
    );

    drop(orchestrator);
    assert_eq!(
        answers.await.unwrap(),
        vec!["SELECT region, SUM(amount) FROM sales GROUP BY region"]
    );
}

#[tokio::test]
async fn test_declined_query_never_executes() {
    let server =
        StubServer::start(vec![StubReply::Json(200, json!({"query": "DELETE FROM t"}))]).await;
    let (orchestrator, _) = setup(http_backend(&server), false);

    let outcome = orchestrator
        .submit("remove everything")
        .unwrap()
        .outcome()
        .await
        .unwrap();

    assert_eq!(outcome, SubmissionOutcome::Declined);
    assert_eq!(server.requests().len(), 1);
    assert_eq!(orchestrator.timeline().len(), 1);
}

#[tokio::test]
async fn test_translation_error_skips_gate_and_executor() {
    let server = StubServer::start(vec![StubReply::Json(
        400,
        json!({"error": "Cannot answer that", "attempts": ["a1", "a2"]}),
    )])
    .await;
    let (orchestrator, answers) = setup(http_backend(&server), true);

    let outcome = orchestrator
        .submit("what is love")
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::Failed(ErrorKind::Translation));
    assert_eq!(server.requests().len(), 1);

    let latest = orchestrator.timeline().latest().unwrap();
    match latest.content() {
        RenderableContent::Error(view) => {
            assert_eq!(view.report.attempts, vec!["a1", "a2"]);
            assert!(!view.attempts.as_ref().unwrap().is_expanded());
        }
        other => panic!("expected error, got {other:?}"),
    }

    drop(orchestrator);
    assert!(answers.await.unwrap().is_empty());
}

#[tokio::test]
async fn test_visualization_repair_over_http() {
    let server = StubServer::start(vec![
        StubReply::Json(
            400,
            json!({
                "error": "VISUALIZATION_COLUMN_ERROR: unknown field 'day'",
                "attempts": ["x=day y=total"],
                "rows": [{"a": 1, "b": 2}]
            }),
        ),
        StubReply::Json(
            200,
            json!({"rows": [{"a": 1, "b": 2}], "visualizationMarkup": "<svg></svg>"}),
        ),
    ])
    .await;
    let (orchestrator, _) = setup(http_backend(&server), false);

    let outcome = orchestrator
        .submit("SELECT a, b FROM t")
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::Completed);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, json!({"query": "SELECT a, b FROM t"}));
    assert_eq!(
        requests[1].body,
        json!({
            "query": "SELECT a, b FROM t",
            "visualizationHint": {"kind": "bar", "xField": "a", "yField": "b"}
        })
    );

    let latest = orchestrator.timeline().latest().unwrap();
    assert!(html::fragment(latest.content()).contains("srcdoc=\"&lt;svg&gt;&lt;/svg&gt;\""));
}

#[tokio::test]
async fn test_failed_repair_surfaces_original_error() {
    let server = StubServer::start(vec![
        StubReply::Json(
            400,
            json!({
                "error": "VISUALIZATION_COLUMN_ERROR: unknown field 'day'",
                "attempts": ["x=day y=total"],
                "rows": [{"a": 1, "b": 2}]
            }),
        ),
        StubReply::Json(500, json!({"error": "renderer crashed"})),
    ])
    .await;
    let (orchestrator, _) = setup(http_backend(&server), false);

    let outcome = orchestrator
        .submit("SELECT a, b FROM t")
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::Failed(ErrorKind::Visualization));
    assert_eq!(server.requests().len(), 2);

    let latest = orchestrator.timeline().latest().unwrap();
    match latest.content() {
        RenderableContent::Error(view) => {
            assert_eq!(
                view.report.message,
                "VISUALIZATION_COLUMN_ERROR: unknown field 'day'"
            );
            assert_eq!(view.report.attempts, vec!["x=day y=total"]);
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_surfaces_as_network_error() {
    let server = StubServer::start(vec![StubReply::Hang]).await;
    let backend = Arc::new(
        HttpBackend::new(&BackendConfig {
            base_url: server.base_url().to_string(),
            timeout_secs: 1,
        })
        .unwrap(),
    );
    let (orchestrator, _) = setup(backend, false);

    let outcome = orchestrator
        .submit("SELECT 1")
        .unwrap()
        .outcome()
        .await
        .unwrap();
    assert_eq!(outcome, SubmissionOutcome::Failed(ErrorKind::Network));

    let latest = orchestrator.timeline().latest().unwrap();
    assert_eq!(
        text::lines(latest.content(), 40),
        vec!["✗ Network error: request timed out".to_string()]
    );
}

#[tokio::test]
async fn test_concurrent_submissions_each_get_one_reply() {
    let backend = Arc::new(MockBackend::new());
    let (orchestrator, _) = setup(backend.clone(), true);

    let submissions: Vec<_> = ["SELECT 1", "orders by status", "tell me a joke", "  "]
        .into_iter()
        .filter_map(|input| orchestrator.submit(input))
        .collect();
    assert_eq!(submissions.len(), 3);

    let mut outcomes = Vec::new();
    for submission in submissions {
        outcomes.push(submission.outcome().await.unwrap());
    }
    assert_eq!(
        outcomes,
        vec![
            SubmissionOutcome::Completed,
            SubmissionOutcome::Completed,
            SubmissionOutcome::Failed(ErrorKind::Translation),
        ]
    );

    let messages = orchestrator.timeline().all();
    assert_eq!(messages.len(), 6);
    assert_eq!(messages.iter().filter(|m| m.role() == Role::User).count(), 3);
    assert!(messages.windows(2).all(|w| w[0].id() < w[1].id()));
    assert_eq!(backend.translate_calls().len(), 2);
    assert_eq!(backend.execute_calls().len(), 2);
}
