//! Centralized shell output.
//!
//! Human mode prints right-aligned status lines to stderr and diagnostics to
//! stdout. JSON mode prints nothing but JSON lines on stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use serde::Serialize;

use crate::core::diagnostic::Diagnostic;

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors.
    Human { color: ColorChoice },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            color: ColorChoice::Auto,
        }
    }
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // In-progress (cyan)
    Checking,

    // Success (green)
    Finished,
    Available,

    // Warning (yellow)
    Missing,
    Warning,

    // Error (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Checking => "Checking",
            Status::Finished => "Finished",
            Status::Available => "Available",
            Status::Missing => "Missing",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Checking => "\x1b[1;36m",
            Status::Finished | Status::Available => "\x1b[1;32m",
            Status::Missing | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Width status words are right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match mode {
            ShellMode::Json => false,
            ShellMode::Human { color } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags. JSON mode wins over color settings.
    pub fn from_flags(no_color: bool, message_format_json: bool) -> Self {
        if message_format_json {
            return Shell::new(ShellMode::Json);
        }
        let color = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Shell::new(ShellMode::Human { color })
    }

    /// Check if shell is in JSON mode.
    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    /// Check if colors are enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message: `{status:>12} {message}`.
    ///
    /// Ignored in JSON mode.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print a diagnostic to stdout. Ignored in JSON mode, where the
    /// builder's event stream carries diagnostics.
    pub fn diagnostic(&self, diag: &Diagnostic) {
        if self.is_json() {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", diag.format(self.use_color));
    }

    /// Print a JSON record to stdout.
    ///
    /// Only works in JSON mode; silently ignored in human mode.
    pub fn json_event<T: Serialize>(&self, event: &T) {
        if !self.is_json() {
            return;
        }
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut out = io::stdout().lock();
                let _ = writeln!(out, "{}", line);
                let _ = out.flush();
            }
            Err(e) => tracing::warn!("failed to serialize JSON record: {}", e),
        }
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}
