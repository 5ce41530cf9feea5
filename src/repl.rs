//! Line-oriented host for the orchestrator.
//!
//! Reads submissions and confirmation answers from one input stream and
//! prints timeline messages as they are appended. Confirmation questions
//! are answered in the order they were asked.

use std::collections::VecDeque;

use futures::future::{self, join_all, BoxFuture};
use futures::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::confirm::ConfirmationRequest;
use crate::error::Result;
use crate::orchestrator::{InputKind, Orchestrator, SubmissionOutcome};
use crate::render::text;
use crate::timeline::Timeline;

/// Input that ends the session.
pub const QUIT_COMMAND: &str = "/quit";

/// Question printed for each generated query.
pub const CONFIRM_PROMPT: &str = "Run this query? [y/N]";

/// Returns true for an answer that approves a query.
pub fn is_approval(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Tracks which timeline messages have been printed.
#[derive(Debug)]
pub struct TimelinePrinter {
    printed: usize,
    max_column_width: usize,
}

impl TimelinePrinter {
    pub fn new(max_column_width: usize) -> Self {
        Self {
            printed: 0,
            max_column_width,
        }
    }

    /// Lines for every message appended since the last call.
    pub fn pending_lines(&mut self, timeline: &Timeline) -> Vec<String> {
        let messages = timeline.since(self.printed);
        self.printed += messages.len();
        messages
            .iter()
            .flat_map(|message| text::message_lines(message, self.max_column_width))
            .collect()
    }
}

/// A submission's outcome, awaited when the session ends.
type PendingOutcome = BoxFuture<'static, Result<SubmissionOutcome>>;

/// Interactive session over an input and output stream.
pub struct Repl<W> {
    orchestrator: Orchestrator,
    timeline: Timeline,
    confirmations: mpsc::UnboundedReceiver<ConfirmationRequest>,
    output: W,
    printer: TimelinePrinter,
}

impl<W: AsyncWrite + Unpin> Repl<W> {
    pub fn new(
        orchestrator: Orchestrator,
        confirmations: mpsc::UnboundedReceiver<ConfirmationRequest>,
        output: W,
        max_column_width: usize,
    ) -> Self {
        Self {
            timeline: orchestrator.timeline().clone(),
            orchestrator,
            confirmations,
            output,
            printer: TimelinePrinter::new(max_column_width),
        }
    }

    /// Runs until `/quit` or end of input, then waits for in-flight
    /// submissions. Unanswered confirmations are declined.
    ///
    /// After a natural-language line no further input is read until that
    /// submission has asked for confirmation or finished, so the next line
    /// answers its question.
    pub async fn run<R: AsyncBufRead + Unpin>(
        mut self,
        input: R,
    ) -> Result<Vec<SubmissionOutcome>> {
        let mut appended = self.timeline.subscribe();
        let mut lines = input.lines();
        let mut pending: VecDeque<ConfirmationRequest> = VecDeque::new();
        let mut submissions: Vec<PendingOutcome> = Vec::new();
        let mut unasked: Option<PendingOutcome> = None;

        loop {
            tokio::select! {
                line = lines.next_line(), if unasked.is_none() => {
                    let Some(line) = line? else {
                        debug!("End of input");
                        break;
                    };

                    if line.trim() == QUIT_COMMAND {
                        break;
                    }

                    if let Some(request) = pending.pop_front() {
                        self.answer(request, &line).await?;
                        if let Some(next) = pending.front() {
                            self.ask(next).await?;
                        }
                        continue;
                    }

                    if let Some(submission) = self.orchestrator.submit(&line) {
                        let kind = submission.kind();
                        debug!(id = %submission.id(), ?kind, "Submitted");
                        let outcome = submission.outcome().boxed();
                        match kind {
                            InputKind::LiteralSql => submissions.push(outcome),
                            InputKind::NaturalLanguage => unasked = Some(outcome),
                        }
                    }
                }
                Some(request) = self.confirmations.recv() => {
                    submissions.extend(unasked.take());
                    pending.push_back(request);
                    if pending.len() == 1 {
                        self.ask(&pending[0]).await?;
                    }
                }
                result = wait_unasked(&mut unasked), if unasked.is_some() => {
                    unasked = None;
                    submissions.push(future::ready(result).boxed());
                }
                Ok(()) = appended.changed() => {
                    self.flush().await?;
                }
            }
        }

        if !pending.is_empty() {
            info!(count = pending.len(), "Declining unanswered confirmations");
        }
        drop(pending);
        self.confirmations.close();
        while let Ok(request) = self.confirmations.try_recv() {
            request.decline();
        }
        submissions.extend(unasked);

        let mut outcomes = Vec::with_capacity(submissions.len());
        for result in join_all(submissions).await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("{}: {}", e.category(), e),
            }
        }

        self.flush().await?;
        Ok(outcomes)
    }

    async fn ask(&mut self, request: &ConfirmationRequest) -> Result<()> {
        self.flush().await?;
        let prompt = format!("Generated SQL:\n  {}\n{CONFIRM_PROMPT} ", request.sql());
        self.write(&prompt).await
    }

    async fn answer(&mut self, request: ConfirmationRequest, line: &str) -> Result<()> {
        if is_approval(line) {
            request.approve();
            Ok(())
        } else {
            request.decline();
            self.write("Query not executed.\n").await
        }
    }

    async fn flush(&mut self) -> Result<()> {
        let lines = self.printer.pending_lines(&self.timeline);
        if lines.is_empty() {
            return Ok(());
        }
        let mut out = lines.join("\n");
        out.push('\n');
        self.write(&out).await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

/// Resolves once the submission held in `unasked` finishes.
async fn wait_unasked(unasked: &mut Option<PendingOutcome>) -> Result<SubmissionOutcome> {
    match unasked.as_mut() {
        Some(outcome) => outcome.await,
        None => future::pending().await,
    }
}
