//! Terminal adapter for rendered content.
//!
//! Produces plain lines: box-drawn tables, error messages with their
//! disclosures, and a placeholder for visualizations (which need a browser;
//! see the HTML transcript).

use super::{
    Disclosure, ErrorView, RenderableContent, ResultBody, ResultView, TableView, NO_RESULTS_TEXT,
};
use crate::timeline::{Message, Role};

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Renders content as terminal lines.
pub fn lines(content: &RenderableContent, max_column_width: usize) -> Vec<String> {
    match content {
        RenderableContent::Text(text) => text.lines().map(String::from).collect(),
        RenderableContent::Result(view) => result_lines(view, max_column_width),
        RenderableContent::Error(view) => error_lines(view),
    }
}

/// Renders a timeline message with its role label.
pub fn message_lines(message: &Message, max_column_width: usize) -> Vec<String> {
    let label = match message.role() {
        Role::User => "You",
        Role::Assistant => "querychat",
    };
    let mut out = vec![format!(
        "{label} [{}]:",
        message.created_at().format("%H:%M:%S")
    )];
    out.extend(
        lines(message.content(), max_column_width)
            .into_iter()
            .map(|line| format!("  {line}")),
    );
    out
}

fn result_lines(view: &ResultView, max_column_width: usize) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(summary) = &view.summary {
        out.extend(summary.lines().map(String::from));
    }
    if let Some(analysis) = &view.analysis {
        out.extend(analysis.lines().map(String::from));
    }
    if view.visualization.is_some() {
        out.push("[visualization available in the HTML transcript]".to_string());
    }
    match &view.body {
        ResultBody::Table(table) => out.extend(table_lines(table, max_column_width)),
        ResultBody::NoResults => out.push(NO_RESULTS_TEXT.to_string()),
    }
    if let Some(trail) = &view.trail {
        let body = trail
            .content()
            .iter()
            .map(|step| format!("{}: {}", step.title, step.detail))
            .collect();
        out.extend(disclosure_lines(trail, "Query trail", body));
    }

    out
}

fn error_lines(view: &ErrorView) -> Vec<String> {
    let mut out = vec![format!("✗ {}", view.report)];
    if let Some(attempts) = &view.attempts {
        out.extend(disclosure_lines(
            attempts,
            "Attempt details",
            attempts.content().clone(),
        ));
    }
    out
}

fn disclosure_lines<T>(disclosure: &Disclosure<T>, title: &str, body: Vec<String>) -> Vec<String> {
    if disclosure.is_expanded() {
        let mut out = vec![format!("▾ {title}")];
        out.extend(body.into_iter().map(|line| format!("    {line}")));
        out
    } else {
        vec![format!("▸ {title} ({} hidden)", body.len())]
    }
}

/// Renders a table with box-drawing borders and a row count footer.
pub fn table_lines(table: &TableView, max_column_width: usize) -> Vec<String> {
    let widths = column_widths(table, max_column_width);
    let mut out = Vec::with_capacity(table.rows.len() + 5);

    out.push(border(&widths, '┌', '┬', '┐'));
    out.push(row_line(&table.columns, &widths));
    out.push(border(&widths, '├', '┼', '┤'));
    for row in &table.rows {
        out.push(row_line(row, &widths));
    }
    out.push(border(&widths, '└', '┴', '┘'));

    let count = table.rows.len();
    out.push(format!(
        "{count} row{} returned",
        if count == 1 { "" } else { "s" }
    ));
    out
}

fn column_widths(table: &TableView, max_column_width: usize) -> Vec<usize> {
    let cap = max_column_width.max(MIN_COLUMN_WIDTH);
    let mut widths: Vec<usize> = table
        .columns
        .iter()
        .map(|column| column.chars().count().max(MIN_COLUMN_WIDTH))
        .collect();

    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    widths.into_iter().map(|w| w.min(cap)).collect()
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|&w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}", segments.join(&mid.to_string()))
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("│");
    for (cell, &width) in cells.iter().zip(widths) {
        line.push_str(&format!(" {:width$} │", truncate(cell, width)));
    }
    line
}

/// Truncates to `max_width` characters, adding an ellipsis if needed.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}
