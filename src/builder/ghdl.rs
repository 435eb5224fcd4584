//! GHDL builder.
//!
//! GHDL prints one diagnostic per line:
//! `<file>:<line>:<column>:[warning:|error:|note:] <message>`.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::diagnostic::{Diagnostic, Severity};
use crate::core::file_type::SourceFileType;
use crate::util::process::ProcessBuilder;

use super::{BuildFlagScope, BuildJob, Builder, BuilderBase, BuilderConfig, BuilderKind, FlagTable};

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GHDL\s+(\S+)").expect("valid version regex"));

static RECORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file>[^:\n]+?\.(?i:vhdl|vhd)):(?P<line>\d+):(?P<column>\d+):\s*(?:(?P<kind>warning|error|note):)?\s*(?P<message>.*)$",
    )
    .expect("valid record regex")
});

const BINARY: &str = "ghdl";

const FILE_TYPES: [SourceFileType; 1] = [SourceFileType::Vhdl];

const BUILTIN_LIBRARIES: [&str; 2] = ["ieee", "std"];

/// GHDL analysis backend for VHDL.
#[derive(Debug)]
pub struct Ghdl {
    base: BuilderBase,
    flags: FlagTable,
}

impl Ghdl {
    /// Create a GHDL builder.
    pub fn new(config: BuilderConfig) -> Self {
        Ghdl {
            base: BuilderBase::new(config),
            flags: FlagTable::new()
                .with(
                    BuildFlagScope::Single,
                    SourceFileType::Vhdl,
                    ["-fexplicit", "-frelaxed-rules"],
                )
                .with(
                    BuildFlagScope::All,
                    SourceFileType::Vhdl,
                    [
                        "-fexplicit",
                        "-frelaxed-rules",
                        "--warn-runtime-error",
                        "--warn-reserved",
                        "--warn-unused",
                    ],
                ),
        }
    }
}

impl Builder for Ghdl {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Ghdl
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

    fn builtin_libraries(&self) -> &[&'static str] {
        &BUILTIN_LIBRARIES
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
            .arg("-a")
            .arg(format!("--workdir={}", job.library_path.display()))
            .arg(format!("--work={}", job.library));

        // Every other library known to this builder is visible to the unit.
        // GHDL resolves its own libraries from its install prefix.
        let work_folder = self.base.work_folder();
        for library in self.base.libraries() {
            if &library != job.library && !self.is_builtin_library(&library) {
                cmd = cmd.arg(format!("-P{}", work_folder.library_path(&library).display()));
            }
        }

        Some(cmd.args(job.flags).arg(job.path))
    }

    fn should_ignore_line(&self, line: &str) -> bool {
        let line = line.trim();
        line.is_empty() || line.starts_with("ghdl:")
    }

    fn make_records(&self, record: &str) -> Vec<Diagnostic> {
        record
            .lines()
            .filter_map(|line| RECORD_RE.captures(line.trim_end()))
            .filter_map(|caps| {
                let line: u32 = caps["line"].parse().ok()?;
                let column: u32 = caps["column"].parse().ok()?;
                let severity = match caps.name("kind").map(|k| k.as_str()) {
                    Some("warning") => Severity::Warning,
                    Some("note") => Severity::Info,
                    _ => Severity::Error,
                };

                Some(
                    Diagnostic::new(self.name(), severity, caps["message"].trim())
                        .with_file(&caps["file"])
                        .with_line(line.saturating_sub(1))
                        .with_column(column.saturating_sub(1)),
                )
            })
            .collect()
    }
}
