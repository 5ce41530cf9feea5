//! HttpBackend against a local stub server.

use pretty_assertions::assert_eq;
use querychat::backend::{
    BackendClient, ExecuteReply, HttpBackend, TranslateReply, TransportError,
};
use querychat::config::BackendConfig;
use querychat::model::{QueryRequest, VisualizationSpec};
use serde_json::json;

use super::stub_server::{StubReply, StubServer};

fn backend(base_url: &str, timeout_secs: u64) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url: base_url.to_string(),
        timeout_secs,
    })
    .unwrap()
}

#[tokio::test]
async fn test_translate_success_with_hint() {
    let server = StubServer::start(vec![StubReply::Json(
        200,
        json!({
            "query": "SELECT status, COUNT(*) AS n FROM orders GROUP BY status",
            "visualizationHint": {"kind": "bar", "xField": "status", "yField": "n"}
        }),
    )])
    .await;

    let reply = backend(server.base_url(), 5)
        .translate("orders per status")
        .await
        .unwrap();

    assert_eq!(
        reply,
        TranslateReply::Translated {
            query: "SELECT status, COUNT(*) AS n FROM orders GROUP BY status".to_string(),
            visualization_hint: Some(VisualizationSpec::new("bar").with_fields("status", "n")),
        }
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/translate_to_sql");
    assert_eq!(requests[0].body, json!({"message": "orders per status"}));
}

#[tokio::test]
async fn test_translate_error_body_with_error_status() {
    let server = StubServer::start(vec![StubReply::Json(
        422,
        json!({"error": "Unknown table", "attempts": ["try 1", "try 2"]}),
    )])
    .await;

    let reply = backend(server.base_url(), 5)
        .translate("list gadgets")
        .await
        .unwrap();

    assert_eq!(
        reply,
        TranslateReply::Rejected {
            error: "Unknown table".to_string(),
            attempts: vec!["try 1".to_string(), "try 2".to_string()],
        }
    );
}

#[tokio::test]
async fn test_execute_sends_hint_and_reads_result() {
    let server = StubServer::start(vec![StubReply::Json(
        200,
        json!({
            "rows": [{"b": 2, "a": 1}],
            "visualizationMarkup": "<div id=\"chart\"></div>",
            "summary": "One row.",
            "analysis": "Column b precedes a."
        }),
    )])
    .await;
    let request = QueryRequest::new("SELECT b, a FROM t")
        .unwrap()
        .with_hint(Some(VisualizationSpec::new("line").with_fields("b", "a")));

    let reply = backend(server.base_url(), 5).execute(&request).await.unwrap();

    let ExecuteReply::Rows(result) = reply else {
        panic!("expected rows, got {reply:?}");
    };
    assert_eq!(result.columns(), vec!["b", "a"]);
    assert_eq!(result.summary.as_deref(), Some("One row."));
    assert_eq!(result.analysis.as_deref(), Some("Column b precedes a."));
    assert_eq!(
        result.visualization_markup.as_deref(),
        Some("<div id=\"chart\"></div>")
    );

    let requests = server.requests();
    assert_eq!(requests[0].path, "/execute_query");
    assert_eq!(
        requests[0].body,
        json!({
            "query": "SELECT b, a FROM t",
            "visualizationHint": {"kind": "line", "xField": "b", "yField": "a"}
        })
    );
}

#[tokio::test]
async fn test_execute_error_keeps_partial_rows() {
    let server = StubServer::start(vec![StubReply::Json(
        500,
        json!({
            "error": "VISUALIZATION_COLUMN_ERROR: no column 'total'",
            "rows": [{"a": 1, "b": 2}]
        }),
    )])
    .await;
    let request = QueryRequest::new("SELECT a, b FROM t").unwrap();

    let reply = backend(server.base_url(), 5).execute(&request).await.unwrap();

    match reply {
        ExecuteReply::Rejected {
            error,
            attempts,
            partial_rows,
        } => {
            assert!(error.starts_with("VISUALIZATION_COLUMN_ERROR"));
            assert!(attempts.is_empty());
            assert_eq!(partial_rows.len(), 1);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = StubServer::start(vec![StubReply::Json(200, json!({"rows": []}))]).await;
    let base_url = format!("{}/api", server.base_url());
    let request = QueryRequest::new("SELECT 1").unwrap();

    backend(&base_url, 5).execute(&request).await.unwrap();

    assert_eq!(server.requests()[0].path, "/api/execute_query");
}

#[tokio::test]
async fn test_unparseable_body_is_malformed() {
    let server = StubServer::start(vec![
        StubReply::Raw(200, "<html>Internal Server Error</html>".to_string()),
        StubReply::Json(200, json!({"unexpected": true})),
    ])
    .await;
    let client = backend(server.base_url(), 5);

    let err = client.translate("anything").await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)), "{err:?}");

    let err = client.translate("anything").await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = StubServer::start(vec![StubReply::Hang]).await;

    let err = backend(server.base_url(), 1)
        .translate("anything")
        .await
        .unwrap_err();

    assert_eq!(err, TransportError::Timeout);
    assert_eq!(err.to_string(), "request timed out");
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = QueryRequest::new("SELECT 1").unwrap();
    let err = backend(&format!("http://{addr}"), 5)
        .execute(&request)
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Connect(_)), "{err:?}");
}
