//! HTML adapter for rendered content.
//!
//! All user and backend text is escaped. Visualization markup only ever
//! reaches the page through a sandboxed `<iframe srcdoc>`.

use std::fmt::Write;

use super::{
    Disclosure, ErrorView, RenderableContent, ResultBody, ResultView, SandboxedFrame, TableView,
    TrailStep, NO_RESULTS_TEXT, SANDBOX_POLICY,
};
use crate::timeline::{Message, Role};

/// Escapes text for use in HTML content and double- or single-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders content as an HTML fragment.
pub fn fragment(content: &RenderableContent) -> String {
    match content {
        RenderableContent::Text(text) => format!("<p>{}</p>", escape(text)),
        RenderableContent::Result(view) => result_fragment(view),
        RenderableContent::Error(view) => error_fragment(view),
    }
}

fn result_fragment(view: &ResultView) -> String {
    let mut out = String::from("<div class=\"query-result\">");

    if let Some(summary) = &view.summary {
        let _ = write!(out, "<div class=\"summary\"><p>{}</p></div>", escape(summary));
    }
    if let Some(analysis) = &view.analysis {
        let _ = write!(out, "<div class=\"analysis\"><p>{}</p></div>", escape(analysis));
    }
    if let Some(frame) = &view.visualization {
        out.push_str(&frame_fragment(frame));
    }
    match &view.body {
        ResultBody::Table(table) => out.push_str(&table_fragment(table)),
        ResultBody::NoResults => {
            let _ = write!(out, "<p class=\"no-results\">{NO_RESULTS_TEXT}</p>");
        }
    }
    if let Some(trail) = &view.trail {
        out.push_str(&disclosure_fragment(
            trail,
            "Query trail",
            &trail_items(trail.content()),
        ));
    }

    out.push_str("</div>");
    out
}

fn table_fragment(table: &TableView) -> String {
    let mut out = String::from("<div class=\"sql-results\"><table><thead><tr>");
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", escape(column));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
    out
}

/// Embeds visualization markup in an isolated frame.
pub fn frame_fragment(frame: &SandboxedFrame) -> String {
    format!(
        "<div class=\"visualization-container\"><iframe sandbox=\"{SANDBOX_POLICY}\" \
         referrerpolicy=\"no-referrer\" style=\"width: 100%; height: 400px; border: none;\" \
         srcdoc=\"{}\"></iframe></div>",
        escape(frame.markup())
    )
}

fn error_fragment(view: &ErrorView) -> String {
    let mut out = String::from("<div class=\"error-container\">");
    let _ = write!(
        out,
        "<div class=\"error-message\" data-kind=\"{}\">{}</div>",
        escape(view.report.kind.label()),
        escape(&view.report.message)
    );
    if let Some(attempts) = &view.attempts {
        out.push_str(&disclosure_fragment(
            attempts,
            "Attempt details",
            &attempt_items(attempts.content()),
        ));
    }
    out.push_str("</div>");
    out
}

fn disclosure_fragment<T>(disclosure: &Disclosure<T>, title: &str, body: &str) -> String {
    let open = if disclosure.is_expanded() { " open" } else { "" };
    format!(
        "<details class=\"disclosure\"{open}><summary>{}</summary>{body}</details>",
        escape(title)
    )
}

fn attempt_items(attempts: &[String]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("<div class=\"error-attempt\">{}</div>", escape(attempt)))
        .collect()
}

fn trail_items(steps: &[TrailStep]) -> String {
    steps
        .iter()
        .map(|step| {
            format!(
                "<div class=\"api-call\"><h4>{}</h4><pre><code>{}</code></pre></div>",
                escape(&step.title),
                escape(&step.detail)
            )
        })
        .collect()
}

/// Renders one timeline message.
pub fn message_fragment(message: &Message) -> String {
    let class = match message.role() {
        Role::User => "user-message",
        Role::Assistant => "assistant-message",
    };
    format!(
        "<div class=\"message {class}\" id=\"message-{}\" data-created-at=\"{}\">{}</div>",
        message.id(),
        message.created_at().to_rfc3339(),
        fragment(message.content())
    )
}

/// Renders a standalone HTML document for a whole timeline.
pub fn transcript(messages: &[Message]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>querychat transcript</title>\n</head>\n<body>\n<div id=\"chat-messages\">\n",
    );
    for message in messages {
        out.push_str(&message_fragment(message));
        out.push('\n');
    }
    out.push_str("</div>\n</body>\n</html>\n");
    out
}
