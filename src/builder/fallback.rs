//! Fallback builder.
//!
//! Used when no real tool is installed. It accepts every file type, is
//! always available, never spawns anything and never reports diagnostics.

use crate::core::diagnostic::Diagnostic;
use crate::core::file_type::SourceFileType;
use crate::util::process::ProcessBuilder;

use super::{BuildJob, Builder, BuilderBase, BuilderConfig, BuilderKind, FlagTable};

/// Version reported by the fallback builder.
pub const FALLBACK_VERSION: &str = "none";

/// No-op builder.
#[derive(Debug)]
pub struct Fallback {
    base: BuilderBase,
    flags: FlagTable,
}

impl Fallback {
    /// Create a fallback builder.
    pub fn new(config: BuilderConfig) -> Self {
        Fallback {
            base: BuilderBase::new(config),
            flags: FlagTable::new(),
        }
    }
}

impl Builder for Fallback {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Fallback
    }

    fn base(&self) -> &BuilderBase {
        &self.base
    }

    fn file_types(&self) -> &[SourceFileType] {
        &SourceFileType::ALL
    }

    fn default_flags(&self) -> &FlagTable {
        &self.flags
    }

    fn version_command(&self) -> Option<ProcessBuilder> {
        None
    }

    fn parse_version(&self, _stdout: &[String]) -> Option<String> {
        Some(FALLBACK_VERSION.to_string())
    }

    fn build_command(&self, _job: &BuildJob<'_>) -> Option<ProcessBuilder> {
        None
    }

    fn should_ignore_line(&self, _line: &str) -> bool {
        true
    }

    fn make_records(&self, _record: &str) -> Vec<Diagnostic> {
        Vec::new()
    }
}
