//! Terminal output and event formatting.
//!
//! `RenderSink` is the output contract consumed by the poll loop and CLI
//! dispatch; `Renderer` is the default terminal implementation. Task event
//! payloads go to stdout, chrome and diagnostics to stderr.

use crate::types::{EventBody, TaskEvent};
use crossterm::style::{Color, Stylize};

/// Injectable rendering interface.
///
/// Tests substitute a recording sink so assertions never depend on captured
/// process output.
pub trait RenderSink: Send + Sync {
    /// Render one formatted task event.
    fn event(&self, text: &str);
    /// Render a titled section line.
    fn section(&self, title: &str);
    /// Render one key/value field row.
    fn field(&self, key: &str, value: &str);
    /// Render plain informational text.
    fn note(&self, text: &str);
    /// Render a warning line.
    fn warn(&self, msg: &str);
    /// Render an error line.
    fn error(&self, msg: &str);
}

/// Format one task event for display.
///
/// Pure function of the event payload; unknown event types fall back to a
/// pretty-printed JSON dump so nothing is silently dropped.
pub fn format_event(event: &TaskEvent) -> String {
    match event.classify() {
        EventBody::AgentResponse { content } => format!("\n[agent] {content}"),
        EventBody::UserInput { content } => format!("\n[you] {content}"),
        EventBody::ApprovalRequest {
            request_id,
            description,
        } => {
            format!("\n[approval required] {description}\n  request id: {request_id}")
        }
        EventBody::Other { kind, body } => {
            let payload =
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
            format!("\n[{kind}] {payload}")
        }
    }
}

/// Handles all terminal output formatting.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    /// Whether ANSI color/style output is enabled.
    color: bool,
}

impl Renderer {
    /// Create a renderer with optional color output.
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl RenderSink for Renderer {
    fn event(&self, text: &str) {
        println!("{text}");
    }

    fn section(&self, title: &str) {
        if self.color {
            eprintln!("{}", title.bold());
        } else {
            eprintln!("{title}");
        }
    }

    fn field(&self, key: &str, value: &str) {
        if self.color {
            eprintln!("  {} {value}", key.with(Color::DarkGrey));
        } else {
            eprintln!("  {key} {value}");
        }
    }

    fn note(&self, text: &str) {
        eprintln!("{text}");
    }

    fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{}", format!("warning: {msg}").with(Color::Yellow));
        } else {
            eprintln!("warning: {msg}");
        }
    }

    fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{}", format!("error: {msg}").with(Color::Red));
        } else {
            eprintln!("error: {msg}");
        }
    }
}
