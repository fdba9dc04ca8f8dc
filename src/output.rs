// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON-lines output modes.

use crate::diagnostics::{Warning, WarningKind};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Success {
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
    },
    Warning {
        kind: WarningKind,
        message: &'a str,
    },
    Error {
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
    },
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    started: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            started: None,
        }
    }

    /// Report elapsed time with success and error messages from now on.
    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    fn elapsed(&self) -> Option<f64> {
        self.started.map(|t| t.elapsed().as_secs_f64())
    }

    fn emit<T: Serialize>(&self, stream: Stream, value: &T) {
        let Ok(json) = serde_json::to_string(value) else {
            return;
        };
        match stream {
            Stream::Stdout => println!("{json}"),
            Stream::Stderr => eprintln!("{json}"),
        }
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print one line of a plan or status report. JSON mode prints `record` instead.
    pub fn report<T: Serialize>(&self, line: &str, record: &T) {
        match self.mode {
            OutputMode::Json => self.emit(Stream::Stdout, record),
            _ => println!("{line}"),
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, warning: &Warning) {
        match self.mode {
            OutputMode::Json => self.emit(
                Stream::Stderr,
                &Event::Warning {
                    kind: warning.kind,
                    message: &warning.message,
                },
            ),
            _ => eprintln!("Warning: {}", warning.message),
        }
    }

    pub fn success(&self, message: &str) {
        match (self.mode, self.elapsed()) {
            (OutputMode::Json, duration_secs) => self.emit(
                Stream::Stdout,
                &Event::Success {
                    message,
                    duration_secs,
                },
            ),
            (OutputMode::Normal, Some(secs)) => println!("{message} ({secs:.1}s)"),
            _ => println!("{message}"),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Json => self.emit(
                Stream::Stderr,
                &Event::Error {
                    message,
                    duration_secs: self.elapsed(),
                },
            ),
            _ => eprintln!("Error: {message}"),
        }
    }
}
