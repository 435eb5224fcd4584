//! HDL builders.
//!
//! A builder integrates one external compiler or linter. Every builder
//! implements the [`Builder`] trait: the tool-specific pieces (command line,
//! output grammar, version probe) are required methods, while the shared
//! protocol (environment check, library creation, build dispatch, output
//! folding) is provided by the trait itself on top of [`BuilderBase`].
//!
//! Builder variants are a closed set, see [`BuilderKind`].

pub mod base;
pub mod detect;
pub mod error;
pub mod events;
pub mod fallback;
pub mod flags;
pub mod ghdl;
pub mod records;
pub mod verilator;

use std::path::{Path, PathBuf};
use std::sync::PoisonError;
use std::time::{Duration, Instant};

use crate::core::diagnostic::Diagnostic;
use crate::core::file_type::SourceFileType;
use crate::core::library::Library;
use crate::core::work_folder::WorkFolder;
use crate::util::process::{CancelToken, ProcessBuilder, ProcessError};

pub use base::{BuilderBase, BuilderConfig, BuilderState};
pub use detect::{detect_builder, BuilderKind};
pub use error::BuilderError;
pub use events::{BuilderEvent, EventSink, JsonSink, MemorySink, TracingSink};
pub use fallback::Fallback;
pub use flags::{BuildFlagScope, FlagTable};
pub use ghdl::Ghdl;
pub use records::RecordScanner;
pub use verilator::Verilator;

/// Per-call build options.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Flag scope
    pub scope: BuildFlagScope,
    /// Caller flags, appended after the builder's defaults
    pub flags: Vec<String>,
    /// Timeout for this call; overrides the builder's default
    pub timeout: Option<Duration>,
    /// Cancellation token for this call
    pub cancel: Option<CancelToken>,
}

impl BuildOptions {
    /// Options for a single-file build with no extra flags.
    pub fn new() -> Self {
        BuildOptions::default()
    }

    /// Set the scope.
    pub fn scope(mut self, scope: BuildFlagScope) -> Self {
        self.scope = scope;
        self
    }

    /// Append caller flags.
    pub fn flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Everything a builder needs to construct one tool invocation.
#[derive(Debug, Clone)]
pub struct BuildJob<'a> {
    /// Source file
    pub path: &'a Path,
    /// Its file type
    pub file_type: SourceFileType,
    /// Target library
    pub library: &'a Library,
    /// Directory the library maps to
    pub library_path: &'a Path,
    /// Resolved flags (defaults then caller flags)
    pub flags: &'a [String],
}

/// Contract every HDL builder satisfies.
pub trait Builder: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> BuilderKind;

    /// Shared state.
    fn base(&self) -> &BuilderBase;

    /// File types this builder accepts.
    fn file_types(&self) -> &[SourceFileType];

    /// Default flags per scope and file type.
    fn default_flags(&self) -> &FlagTable;

    /// Command that prints the tool version, `None` when there is no tool.
    fn version_command(&self) -> Option<ProcessBuilder>;

    /// Extract the version number from the version command's stdout.
    fn parse_version(&self, stdout: &[String]) -> Option<String>;

    /// Command that builds one source file, `None` when there is no tool.
    fn build_command(&self, job: &BuildJob<'_>) -> Option<ProcessBuilder>;

    /// Cheap pre-filter for known noise. Must never drop a line that would
    /// otherwise produce a diagnostic.
    fn should_ignore_line(&self, line: &str) -> bool;

    /// Extract diagnostics from one logical output record.
    fn make_records(&self, record: &str) -> Vec<Diagnostic>;

    /// Maximum number of physical lines in one record.
    fn record_span(&self) -> usize {
        1
    }

    /// Whether a line opens a new record.
    fn starts_record(&self, _line: &str) -> bool {
        true
    }

    /// Libraries the tool ships with.
    fn builtin_libraries(&self) -> &[&'static str] {
        &[]
    }

    /// Whether `library` is one the tool ships with.
    fn is_builtin_library(&self, library: &Library) -> bool {
        self.builtin_libraries().iter().any(|b| *b == library.name())
    }

    /// Builder name, as reported in diagnostics.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Program this builder runs, if it runs one.
    fn program(&self) -> Option<PathBuf> {
        self.kind().binary().map(|binary| self.base().program(binary))
    }

    /// Cached tool version, once the environment check succeeded.
    fn version(&self) -> Option<&str> {
        self.base().version()
    }

    /// Current environment state.
    fn state(&self) -> BuilderState {
        self.base().state()
    }

    /// The work folder this builder owns.
    fn work_folder(&self) -> &WorkFolder {
        self.base().work_folder()
    }

    /// Libraries created or used through this builder.
    fn libraries(&self) -> Vec<Library> {
        self.base().libraries()
    }

    /// Whether this builder accepts a file type.
    fn supports(&self, file_type: SourceFileType) -> bool {
        self.file_types().contains(&file_type)
    }

    /// Best-effort probe. Never fails and never changes the builder state.
    fn is_available(&self) -> bool {
        let Some(cmd) = self.version_command() else {
            return true;
        };
        let base = self.base();
        match base.runner().run_checked(&cmd, base.timeout(), None) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("{} is not available: {}", self.name(), e);
                false
            }
        }
    }

    /// Probe the tool and cache its version, under the builder's default
    /// timeout.
    fn check_environment(&self) -> Result<(), BuilderError> {
        self.check_environment_within(self.base().timeout(), None)
    }

    /// Probe the tool and cache its version.
    ///
    /// Runs the probe only once per instance. A failure, timeouts included,
    /// makes the builder unavailable for the rest of its life. A cancelled
    /// probe leaves it unchecked.
    fn check_environment_within(
        &self,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<(), BuilderError> {
        let base = self.base();
        let mut state = base.lock_state();

        match *state {
            BuilderState::Ready => return Ok(()),
            BuilderState::Unavailable => {
                return Err(BuilderError::Unavailable {
                    builder: self.name().to_string(),
                })
            }
            BuilderState::Unchecked => {}
        }

        let raw = match self.version_command() {
            None => Ok(Vec::new()),
            Some(cmd) => match base.runner().run_checked(&cmd, timeout, cancel) {
                Ok(output) => Ok(output.stdout_lines()),
                Err(ProcessError::Cancelled { program }) => {
                    return Err(BuilderError::BuildCancelled {
                        builder: self.name().to_string(),
                        program,
                    })
                }
                Err(e) => Err(e.to_string()),
            },
        };
        let probe = raw.and_then(|raw| match self.parse_version(&raw) {
            Some(version) => Ok((raw, version)),
            None => Err(format!(
                "could not parse a version from {:?}",
                raw.first().map(String::as_str).unwrap_or_default()
            )),
        });

        match probe {
            Ok((raw, version)) => {
                base.set_version(version.clone());
                *state = BuilderState::Ready;
                base.emit(BuilderEvent::EnvironmentChecked {
                    builder: self.name().to_string(),
                    raw,
                    version,
                });
                Ok(())
            }
            Err(reason) => {
                *state = BuilderState::Unavailable;
                base.emit(BuilderEvent::EnvironmentFailed {
                    builder: self.name().to_string(),
                    message: reason.clone(),
                });
                Err(BuilderError::EnvironmentCheckFailed {
                    builder: self.name().to_string(),
                    reason,
                })
            }
        }
    }

    /// Ensure the directory for `library` exists in the work folder.
    ///
    /// Idempotent, and safe against a concurrent caller creating the same
    /// library.
    fn create_library(&self, library: &Library) -> Result<PathBuf, BuilderError> {
        let base = self.base();
        let path = base.work_folder().library_path(library);

        let created = base
            .work_folder()
            .ensure_library(library)
            .map_err(|source| BuilderError::LibraryCreationFailed {
                library: library.to_string(),
                path: path.clone(),
                source,
            })?;

        base.register_library(library);

        if created {
            base.emit(BuilderEvent::LibraryCreated {
                builder: self.name().to_string(),
                library: library.to_string(),
                path: path.clone(),
            });
        }

        Ok(path)
    }

    /// Build one source file into `library` and return its diagnostics.
    ///
    /// Unsupported file types are rejected before anything is run. The
    /// environment is checked first if that has not happened yet, under the
    /// same timeout and cancellation token as the build. Builds into one
    /// library run one at a time.
    fn build_source(
        &self,
        path: &Path,
        library: &Library,
        options: &BuildOptions,
    ) -> Result<Vec<Diagnostic>, BuilderError> {
        let file_type = match SourceFileType::from_path(path) {
            Some(ft) if self.supports(ft) => ft,
            other => {
                return Err(BuilderError::UnsupportedFileType {
                    builder: self.name().to_string(),
                    path: path.to_path_buf(),
                    file_type: other,
                })
            }
        };

        let base = self.base();
        let timeout = options.timeout.or(base.timeout());
        self.check_environment_within(timeout, options.cancel.as_ref())?;
        let library_path = self.create_library(library)?;

        let lock = base.library_lock(library);
        let _serial = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let flags = self
            .default_flags()
            .resolve(options.scope, file_type, &options.flags);
        let Some(cmd) = self.build_command(&BuildJob {
            path,
            file_type,
            library,
            library_path: &library_path,
            flags: &flags,
        }) else {
            tracing::debug!("{} has nothing to run for {}", self.name(), path.display());
            return Ok(Vec::new());
        };

        base.emit(BuilderEvent::BuildStarted {
            builder: self.name().to_string(),
            path: path.to_path_buf(),
            library: library.to_string(),
            command: cmd.display_command(),
        });

        let started = Instant::now();
        let output = base
            .runner()
            .run(&cmd, timeout, options.cancel.as_ref())
            .map_err(|e| BuilderError::from_process(self.name(), e))?;

        if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(BuilderError::BuildCancelled {
                builder: self.name().to_string(),
                program: cmd.get_program().display().to_string(),
            });
        }

        let diagnostics = self.parse_output(&output.all_lines());

        for diag in &diagnostics {
            base.emit(BuilderEvent::Diagnostic(diag.clone()));
        }
        base.emit(BuilderEvent::BuildFinished {
            builder: self.name().to_string(),
            path: path.to_path_buf(),
            exit_code: output.status,
            diagnostics: diagnostics.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        Ok(diagnostics)
    }

    /// Fold raw output lines into diagnostics.
    ///
    /// Ignored lines are dropped, the rest grouped into records; records
    /// that match nothing are skipped.
    fn parse_output(&self, lines: &[String]) -> Vec<Diagnostic> {
        let kept = lines
            .iter()
            .map(String::as_str)
            .filter(|line| !self.should_ignore_line(line));
        let records = records::group_records(kept, self.record_span(), |line| {
            self.starts_record(line)
        });

        let mut diagnostics = Vec::new();
        for record in records {
            let found = self.make_records(&record);
            if found.is_empty() {
                self.base().emit(BuilderEvent::LineSkipped {
                    builder: self.name().to_string(),
                    line: record,
                });
            } else {
                diagnostics.extend(found);
            }
        }
        diagnostics
    }
}
