//! The normalized diagnostic model.
//!
//! Every builder translates its tool's output into [`Diagnostic`] records.
//! Records are plain data: they are built once by a builder's record
//! extractor and never mutated afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Get the severity as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiler-reported issue in normalized form.
///
/// Line and column numbers are 0-based regardless of what the tool prints.
/// Two diagnostics are equal iff every field is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the builder that produced this record
    pub builder_name: String,
    /// Message text
    pub text: String,
    /// Source file the message refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Severity level
    pub severity: Severity,
    /// 0-based line number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// 0-based column number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

impl Diagnostic {
    /// Create a diagnostic with no location.
    pub fn new(builder_name: impl Into<String>, severity: Severity, text: impl Into<String>) -> Self {
        Diagnostic {
            builder_name: builder_name.into(),
            text: text.into(),
            file_path: None,
            severity,
            line_number: None,
            column_number: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(builder_name: impl Into<String>, text: impl Into<String>) -> Self {
        Diagnostic::new(builder_name, Severity::Error, text)
    }

    /// Create a warning diagnostic.
    pub fn warning(builder_name: impl Into<String>, text: impl Into<String>) -> Self {
        Diagnostic::new(builder_name, Severity::Warning, text)
    }

    /// Attach a source file.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Attach a 0-based line number.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }

    /// Attach a 0-based column number.
    pub fn with_column(mut self, column: u32) -> Self {
        self.column_number = Some(column);
        self
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Key for callers that want file/line ordering.
    pub fn sort_key(&self) -> (Option<&Path>, Option<u32>, Option<u32>) {
        (
            self.file_path.as_deref(),
            self.line_number,
            self.column_number,
        )
    }

    /// Format the diagnostic for terminal output.
    ///
    /// Locations are printed 1-based, the way editors and compilers show them.
    pub fn format(&self, color: bool) -> String {
        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Info => "\x1b[1;36minfo\x1b[0m",
            }
        } else {
            self.severity.as_str()
        };

        let mut lines = self.text.lines();
        let first = lines.next().unwrap_or_default();

        let mut output = format!("{}[{}]: {}\n", severity_str, self.builder_name, first);
        for line in lines {
            output.push_str(&format!("  | {}\n", line));
        }

        if let Some(ref path) = self.file_path {
            match (self.line_number, self.column_number) {
                (Some(line), Some(col)) => {
                    output.push_str(&format!("  --> {}:{}:{}\n", path.display(), line + 1, col + 1))
                }
                (Some(line), None) => {
                    output.push_str(&format!("  --> {}:{}\n", path.display(), line + 1))
                }
                _ => output.push_str(&format!("  --> {}\n", path.display())),
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_field_wise() {
        let a = Diagnostic::error("verilator", "syntax error")
            .with_file("top.sv")
            .with_line(41);
        let b = Diagnostic::error("verilator", "syntax error")
            .with_file("top.sv")
            .with_line(41);
        assert_eq!(a, b);

        let c = b.clone().with_column(0);
        assert_ne!(a, c);
        assert_ne!(a, Diagnostic::warning("verilator", "syntax error").with_file("top.sv").with_line(41));
    }

    #[test]
    fn test_format_shows_one_based_location() {
        let diag = Diagnostic::warning("ghdl", "signal unused\nsecond line")
            .with_file("top.vhd")
            .with_line(9)
            .with_column(4);

        let output = diag.format(false);
        assert!(output.starts_with("warning[ghdl]: signal unused\n"));
        assert!(output.contains("  | second line"));
        assert!(output.contains("--> top.vhd:10:5"));
    }

    #[test]
    fn test_json_skips_missing_fields() {
        let diag = Diagnostic::error("fallback", "boom");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"error\""));
        assert!(!json.contains("line_number"));
        assert!(!json.contains("file_path"));
    }

    #[test]
    fn test_sort_key_orders_by_file_then_line() {
        let mut diags = vec![
            Diagnostic::error("v", "b").with_file("b.v").with_line(1),
            Diagnostic::error("v", "a2").with_file("a.v").with_line(7),
            Diagnostic::error("v", "a1").with_file("a.v").with_line(2),
        ];
        diags.sort_by(|x, y| x.sort_key().cmp(&y.sort_key()));
        let texts: Vec<_> = diags.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, ["a1", "a2", "b"]);
    }
}
