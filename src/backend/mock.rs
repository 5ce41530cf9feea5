//! Mock backend for testing and offline runs.
//!
//! Replies can be scripted per endpoint; once a script runs out the mock
//! falls back to deterministic canned behaviour. Every call is recorded so
//! tests can assert what reached the backend.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{BackendClient, ExecuteReply, TranslateReply, TransportError};
use crate::model::{QueryRequest, QueryResult, Row, VisualizationSpec};

/// A mock backend that returns scripted or canned replies.
#[derive(Debug, Default)]
pub struct MockBackend {
    translations: Mutex<VecDeque<Result<TranslateReply, TransportError>>>,
    executions: Mutex<VecDeque<Result<ExecuteReply, TransportError>>>,
    translate_calls: Mutex<Vec<String>>,
    execute_calls: Mutex<Vec<QueryRequest>>,
    latency: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBackend {
    /// Creates a mock with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a scripted reply for a translation call.
    pub fn with_translation(self, reply: Result<TranslateReply, TransportError>) -> Self {
        lock(&self.translations).push_back(reply);
        self
    }

    /// Queues a scripted reply for an execution call.
    pub fn with_execution(self, reply: Result<ExecuteReply, TransportError>) -> Self {
        lock(&self.executions).push_back(reply);
        self
    }

    /// Delays every reply by the given duration.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Texts sent to the translation endpoint, in call order.
    pub fn translate_calls(&self) -> Vec<String> {
        lock(&self.translate_calls).clone()
    }

    /// Requests sent to the execution endpoint, in call order.
    pub fn execute_calls(&self) -> Vec<QueryRequest> {
        lock(&self.execute_calls).clone()
    }

    /// Canned translation used when no reply is scripted.
    fn canned_translation(text: &str) -> TranslateReply {
        let lower = text.to_lowercase();

        if lower.contains("orders") {
            return TranslateReply::Translated {
                query: "SELECT status, COUNT(*) AS total FROM orders GROUP BY status".to_string(),
                visualization_hint: Some(
                    VisualizationSpec::new("bar").with_fields("status", "total"),
                ),
            };
        }

        if lower.contains("users") {
            return TranslateReply::Translated {
                query: "SELECT * FROM users".to_string(),
                visualization_hint: None,
            };
        }

        TranslateReply::Rejected {
            error: "I don't understand that question. Could you please rephrase it?".to_string(),
            attempts: Vec::new(),
        }
    }

    /// Canned execution used when no reply is scripted.
    fn canned_execution(request: &QueryRequest) -> ExecuteReply {
        let mut row = Row::new();
        row.insert(
            "result".to_string(),
            serde_json::Value::String(format!("Mock result for: {}", request.sql())),
        );
        ExecuteReply::Rows(QueryResult::with_rows(vec![row]))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn translate(&self, text: &str) -> Result<TranslateReply, TransportError> {
        lock(&self.translate_calls).push(text.to_string());
        let scripted = lock(&self.translations).pop_front();
        self.simulate_latency().await;
        scripted.unwrap_or_else(|| Ok(Self::canned_translation(text)))
    }

    async fn execute(&self, request: &QueryRequest) -> Result<ExecuteReply, TransportError> {
        lock(&self.execute_calls).push(request.clone());
        let scripted = lock(&self.executions).pop_front();
        self.simulate_latency().await;
        scripted.unwrap_or_else(|| Ok(Self::canned_execution(request)))
    }
}
