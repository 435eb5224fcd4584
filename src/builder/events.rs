//! Builder events.
//!
//! Builders never log through a global logger of their own. Instead they
//! report what they do to an injected [`EventSink`]. The default sink
//! forwards events to `tracing`; the CLI can stream them as JSON lines
//! (`--message-format=json`); tests record them in memory.
//!
//! # Event Types
//!
//! - `environment-checked`: the tool answered its version probe
//! - `environment-failed`: the version probe failed; the builder is unusable
//! - `library-created`: a library directory was created in the work folder
//! - `build-started`: a tool invocation is about to run
//! - `build-finished`: a tool invocation completed and its output was parsed
//! - `line-skipped`: an output record did not match the tool's grammar
//! - `diagnostic`: a normalized diagnostic

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;

use crate::core::diagnostic::Diagnostic;

/// An event emitted by a builder.
///
/// Each event is serialized as a single JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason")]
pub enum BuilderEvent {
    #[serde(rename = "environment-checked")]
    EnvironmentChecked {
        builder: String,
        /// Raw version output
        raw: Vec<String>,
        /// Parsed version number
        version: String,
    },

    #[serde(rename = "environment-failed")]
    EnvironmentFailed {
        builder: String,
        /// Why the probe failed
        message: String,
    },

    #[serde(rename = "library-created")]
    LibraryCreated {
        builder: String,
        library: String,
        path: PathBuf,
    },

    #[serde(rename = "build-started")]
    BuildStarted {
        builder: String,
        path: PathBuf,
        library: String,
        /// Full command line, for display only
        command: String,
    },

    #[serde(rename = "build-finished")]
    BuildFinished {
        builder: String,
        path: PathBuf,
        /// Tool exit code
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
        /// Number of diagnostics extracted
        diagnostics: usize,
        /// Duration in milliseconds
        duration_ms: u64,
    },

    #[serde(rename = "line-skipped")]
    LineSkipped { builder: String, line: String },

    #[serde(rename = "diagnostic")]
    Diagnostic(Diagnostic),
}

impl BuilderEvent {
    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receiver for builder events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &BuilderEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &BuilderEvent) {
        match event {
            BuilderEvent::EnvironmentChecked {
                builder,
                raw,
                version,
            } => {
                tracing::info!(
                    "{} version string: '{}'. Version number is '{}'",
                    builder,
                    raw.join(" "),
                    version
                );
            }
            BuilderEvent::EnvironmentFailed { builder, message } => {
                tracing::warn!("{} is not usable: {}", builder, message);
            }
            BuilderEvent::LibraryCreated { library, path, .. } => {
                tracing::debug!("created library `{}` at {}", library, path.display());
            }
            BuilderEvent::BuildStarted { command, .. } => {
                tracing::debug!("running `{}`", command);
            }
            BuilderEvent::BuildFinished {
                builder,
                path,
                diagnostics,
                duration_ms,
                ..
            } => {
                tracing::debug!(
                    "{} built {} in {}ms ({} diagnostic(s))",
                    builder,
                    path.display(),
                    duration_ms,
                    diagnostics
                );
            }
            BuilderEvent::LineSkipped { line, .. } => {
                tracing::debug!("skipping unrecognized output: {:?}", line);
            }
            BuilderEvent::Diagnostic(diag) => {
                tracing::trace!("{:?}", diag);
            }
        }
    }
}

/// Writes every event as one JSON line.
#[derive(Debug)]
pub struct JsonSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonSink<W> {
    /// Create a sink writing to `out`.
    pub fn new(out: W) -> Self {
        JsonSink {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> EventSink for JsonSink<W> {
    fn emit(&self, event: &BuilderEvent) {
        if let Ok(mut out) = self.out.lock() {
            if let Err(e) = writeln!(out, "{}", event.to_json()) {
                tracing::warn!("failed to write build event: {}", e);
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<BuilderEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<BuilderEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &BuilderEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
