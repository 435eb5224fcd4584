//! Verilator builder.
//!
//! Verilator reports diagnostics as
//!
//! ```text
//! %<severity>: <file>:<line>:[<column>:] <message>
//! <continuation>
//! <continuation>
//! ```
//!
//! where one diagnostic spans at most three physical lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::diagnostic::{Diagnostic, Severity};
use crate::core::file_type::SourceFileType;
use crate::util::process::ProcessBuilder;

use super::{BuildFlagScope, BuildJob, Builder, BuilderBase, BuilderConfig, BuilderKind, FlagTable};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Verilator\s+(\S+)").expect("valid version regex"));

static RECORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^%(?P<severity>[A-Za-z][\w-]*):\s*(?P<file>[^:\n]+?\.(?i:svh|sv|vh|v)):(?P<line>\d+):(?:(?P<column>\d+):)?(?P<message>[^\n]*(?:\n[^%\n][^\n]*){0,2})",
    )
    .expect("valid record regex")
});

const BINARY: &str = "verilator";

const FILE_TYPES: [SourceFileType; 2] = [SourceFileType::Verilog, SourceFileType::SystemVerilog];

/// Verilator lint/compile backend for Verilog and SystemVerilog.
#[derive(Debug)]
pub struct Verilator {
    base: BuilderBase,
    flags: FlagTable,
}

impl Verilator {
    /// Create a Verilator builder.
    pub fn new(config: BuilderConfig) -> Self {
        Verilator {
            base: BuilderBase::new(config),
            flags: default_flags(),
        }
    }
}

/// Both scopes use the same lint level; `-sv` is added per file type by
/// the command line itself.
fn default_flags() -> FlagTable {
    let mut table = FlagTable::new();
    for scope in [BuildFlagScope::Single, BuildFlagScope::All] {
        table = table
            .with(scope, SourceFileType::Verilog, ["-Wall"])
            .with(scope, SourceFileType::SystemVerilog, ["-Wall"]);
    }
    table
}

fn severity_of(token: &str) -> Severity {
    if token.to_ascii_lowercase().contains("warning") {
        Severity::Warning
    } else {
        Severity::Error
    }
}

impl Builder for Verilator {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Verilator
    }

    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn file_types(&self) -> &[SourceFileType] {
        &FILE_TYPES
    }

    fn default_flags(&self) -> &FlagTable {
        &self.flags
    }

    fn version_command(&self) -> Option<ProcessBuilder> {
        Some(ProcessBuilder::new(self.base.program(BINARY)).arg("--version"))
    }

    fn parse_version(&self, stdout: &[String]) -> Option<String> {
        let first = stdout.first()?;
        VERSION_RE
            .captures(first)
            .map(|caps| caps[1].to_string())
    }

    fn build_command(&self, job: &BuildJob<'_>) -> Option<ProcessBuilder> {
        let mut cmd = ProcessBuilder::new(self.base.program(BINARY))
            .arg("--cc")
            .arg("-O0")
            .arg("--Mdir")
            .arg(job.library_path);

        if job.file_type == SourceFileType::SystemVerilog {
            cmd = cmd.arg("-sv");
        }

        Some(cmd.args(job.flags).arg(job.path))
    }

    fn should_ignore_line(&self, line: &str) -> bool {
        let line = line.trim_end();
        line.trim_start().is_empty()
            || line.starts_with("- V")
            || line.starts_with("%Error: Exiting due to")
    }

    fn record_span(&self) -> usize {
        3
    }

    fn starts_record(&self, line: &str) -> bool {
        line.starts_with('%')
    }

    fn make_records(&self, record: &str) -> Vec<Diagnostic> {
        RECORD_RE
            .captures_iter(record)
            .filter_map(|caps| {
                let line: u32 = caps["line"].parse().ok()?;
                let text = caps["message"]
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");

                let mut diag = Diagnostic::new(self.name(), severity_of(&caps["severity"]), text)
                    .with_file(caps["file"].trim())
                    .with_line(line.saturating_sub(1));

                if let Some(column) = caps.name("column").and_then(|c| c.as_str().parse::<u32>().ok()) {
                    diag = diag.with_column(column.saturating_sub(1));
                }

                Some(diag)
            })
            .collect()
    }
}
