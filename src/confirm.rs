//! User approval of generated SQL.
//!
//! Translated queries run only after the user approves them. The gate is a
//! narrow async port so the pipeline does not depend on how the host asks.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Asks the user whether a generated query may run.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    /// Resolves to `true` only on explicit approval. Never times out.
    async fn confirm(&self, sql: &str) -> bool;
}

/// A pending question for the host to answer.
///
/// Dropping it unanswered counts as a decline.
#[derive(Debug)]
pub struct ConfirmationRequest {
    sql: String,
    responder: oneshot::Sender<bool>,
}

impl ConfirmationRequest {
    /// The SQL awaiting approval.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn approve(self) {
        self.answer(true);
    }

    pub fn decline(self) {
        self.answer(false);
    }

    fn answer(self, approved: bool) {
        // The submission may already be gone; nothing to tell it then.
        let _ = self.responder.send(approved);
    }
}

/// Gate that forwards every question to the host over a channel.
#[derive(Debug, Clone)]
pub struct ChannelConfirmationGate {
    requests: mpsc::UnboundedSender<ConfirmationRequest>,
}

impl ChannelConfirmationGate {
    /// Creates the gate and the receiver the host answers from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConfirmationRequest>) {
        let (requests, receiver) = mpsc::unbounded_channel();
        (Self { requests }, receiver)
    }
}

#[async_trait]
impl ConfirmationGate for ChannelConfirmationGate {
    async fn confirm(&self, sql: &str) -> bool {
        let (responder, answer) = oneshot::channel();
        let request = ConfirmationRequest {
            sql: sql.to_string(),
            responder,
        };

        if self.requests.send(request).is_err() {
            debug!("No host listening for confirmations, declining");
            return false;
        }

        answer.await.unwrap_or(false)
    }
}
