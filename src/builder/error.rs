//! Builder error types.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::diagnostic::Diagnostic;
use crate::core::file_type::SourceFileType;
use crate::core::library::LibraryNameError;
use crate::util::process::ProcessError;

/// Error raised by a builder operation.
///
/// Every variant is attached to one builder call; none of them takes the
/// host down. Only `EnvironmentCheckFailed` and `Unavailable` concern the
/// builder instance as a whole.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuilderError {
    #[error("{builder} environment check failed: {reason}")]
    #[diagnostic(
        code(hdlcheck::builder::environment),
        help("Make sure the tool is installed and on PATH, or configure its path")
    )]
    EnvironmentCheckFailed { builder: String, reason: String },

    #[error("{builder} is unavailable for this session")]
    #[diagnostic(
        code(hdlcheck::builder::unavailable),
        help("The environment check already failed; create a new builder to probe again")
    )]
    Unavailable { builder: String },

    #[error("{builder} cannot build {}{}", path.display(), describe_type(*file_type))]
    #[diagnostic(code(hdlcheck::builder::unsupported_file_type))]
    UnsupportedFileType {
        builder: String,
        path: PathBuf,
        file_type: Option<SourceFileType>,
    },

    #[error(transparent)]
    #[diagnostic(code(hdlcheck::builder::library_name))]
    InvalidLibraryName(#[from] LibraryNameError),

    #[error("failed to create library `{library}` at {}", path.display())]
    #[diagnostic(code(hdlcheck::builder::library))]
    LibraryCreationFailed {
        library: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{builder}: `{program}` timed out after {timeout:?}")]
    #[diagnostic(
        code(hdlcheck::builder::timeout),
        help("Increase the timeout with --timeout or `build.timeout_secs`")
    )]
    ToolTimeout {
        builder: String,
        program: String,
        timeout: Duration,
    },

    #[error("{builder}: build with `{program}` was cancelled")]
    #[diagnostic(code(hdlcheck::builder::cancelled))]
    BuildCancelled { builder: String, program: String },

    #[error("{builder}: failed to launch `{program}`")]
    #[diagnostic(code(hdlcheck::builder::launch))]
    ToolLaunchFailed {
        builder: String,
        program: String,
        #[source]
        source: ProcessError,
    },
}

fn describe_type(file_type: Option<SourceFileType>) -> String {
    match file_type {
        Some(ft) => format!(" (file type `{}` is not supported)", ft),
        None => " (unknown file type)".to_string(),
    }
}

impl BuilderError {
    /// Map a process failure during a build to the builder taxonomy.
    pub fn from_process(builder: &str, err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout { program, timeout } => BuilderError::ToolTimeout {
                builder: builder.to_string(),
                program,
                timeout,
            },
            ProcessError::Cancelled { program } => BuilderError::BuildCancelled {
                builder: builder.to_string(),
                program,
            },
            other => BuilderError::ToolLaunchFailed {
                builder: builder.to_string(),
                program: other.program().to_string(),
                source: other,
            },
        }
    }

    /// Whether the failure concerns the builder instance rather than one call.
    pub fn is_fatal_to_builder(&self) -> bool {
        matches!(
            self,
            BuilderError::EnvironmentCheckFailed { .. } | BuilderError::Unavailable { .. }
        )
    }

    /// Express the failure as an error record for the file it concerns.
    pub fn to_diagnostic(&self, builder_name: &str) -> Diagnostic {
        let diag = Diagnostic::error(builder_name, self.to_string());
        match self {
            BuilderError::UnsupportedFileType { path, .. } => diag.with_file(path.clone()),
            _ => diag,
        }
    }
}
