//! State shared by every builder: work folder, tool location, runner,
//! event sink, environment state and the cached version.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use crate::builder::events::{BuilderEvent, EventSink, TracingSink};
use crate::core::library::Library;
use crate::core::work_folder::WorkFolder;
use crate::util::process::{CommandRunner, SystemRunner};

/// Environment state of a builder instance.
///
/// `Unchecked` moves to `Ready` or `Unavailable` on the first environment
/// check. `Unavailable` is terminal for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderState {
    #[default]
    Unchecked,
    Ready,
    Unavailable,
}

/// Construction parameters for a builder.
#[derive(Clone)]
pub struct BuilderConfig {
    /// Work folder root
    pub work_folder: PathBuf,
    /// Explicit tool binary; `None` uses the builder's default binary name
    pub tool_path: Option<PathBuf>,
    /// Default timeout for every tool invocation
    pub timeout: Option<Duration>,
    /// How commands are run
    pub runner: Arc<dyn CommandRunner>,
    /// Where events go
    pub events: Arc<dyn EventSink>,
}

impl BuilderConfig {
    /// Create a config that runs real processes and logs through `tracing`.
    pub fn new(work_folder: impl Into<PathBuf>) -> Self {
        BuilderConfig {
            work_folder: work_folder.into(),
            tool_path: None,
            timeout: None,
            runner: Arc::new(SystemRunner),
            events: Arc::new(TracingSink),
        }
    }

    /// Use an explicit tool binary.
    pub fn tool_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tool_path = Some(path.into());
        self
    }

    /// Set the default timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a different command runner.
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Use a different event sink.
    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }
}

impl std::fmt::Debug for BuilderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderConfig")
            .field("work_folder", &self.work_folder)
            .field("tool_path", &self.tool_path)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Shared builder state. Every concrete builder owns one.
pub struct BuilderBase {
    work_folder: WorkFolder,
    tool_path: Option<PathBuf>,
    timeout: Option<Duration>,
    runner: Arc<dyn CommandRunner>,
    events: Arc<dyn EventSink>,
    state: Mutex<BuilderState>,
    version: OnceLock<String>,
    libraries: Mutex<BTreeSet<Library>>,
    library_locks: Mutex<BTreeMap<Library, Arc<Mutex<()>>>>,
}

impl BuilderBase {
    /// Create the shared state from a config.
    pub fn new(config: BuilderConfig) -> Self {
        BuilderBase {
            work_folder: WorkFolder::new(config.work_folder),
            tool_path: config.tool_path,
            timeout: config.timeout,
            runner: config.runner,
            events: config.events,
            state: Mutex::new(BuilderState::Unchecked),
            version: OnceLock::new(),
            libraries: Mutex::new(BTreeSet::new()),
            library_locks: Mutex::new(BTreeMap::new()),
        }
    }

    /// The work folder.
    pub fn work_folder(&self) -> &WorkFolder {
        &self.work_folder
    }

    /// The program to run: the configured path, or `default_binary`.
    pub fn program(&self, default_binary: &str) -> PathBuf {
        self.tool_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_binary))
    }

    /// Default timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Command runner.
    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Report an event.
    pub fn emit(&self, event: BuilderEvent) {
        self.events.emit(&event);
    }

    /// Current environment state.
    pub fn state(&self) -> BuilderState {
        *self.lock_state()
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, BuilderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached version, set by the first successful environment check.
    pub fn version(&self) -> Option<&str> {
        self.version.get().map(String::as_str)
    }

    pub(crate) fn set_version(&self, version: String) {
        // The version is captured once per instance.
        let _ = self.version.set(version);
    }

    /// Libraries created or used through this builder, sorted by name.
    pub fn libraries(&self) -> Vec<Library> {
        self.libraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub(crate) fn register_library(&self, library: &Library) {
        self.libraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(library.clone());
    }

    /// Lock serializing tool runs that write into `library`.
    pub(crate) fn library_lock(&self, library: &Library) -> Arc<Mutex<()>> {
        self.library_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(library.clone())
            .or_default()
            .clone()
    }
}

impl std::fmt::Debug for BuilderBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderBase")
            .field("work_folder", &self.work_folder)
            .field("tool_path", &self.tool_path)
            .field("state", &self.state.try_lock().map(|s| *s).ok())
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_defaults_to_binary_name() {
        let base = BuilderBase::new(BuilderConfig::new("/tmp/work"));
        assert_eq!(base.program("verilator"), PathBuf::from("verilator"));

        let base = BuilderBase::new(BuilderConfig::new("/tmp/work").tool_path("/opt/bin/verilator"));
        assert_eq!(base.program("verilator"), PathBuf::from("/opt/bin/verilator"));
    }

    #[test]
    fn test_version_is_set_once() {
        let base = BuilderBase::new(BuilderConfig::new("/tmp/work"));
        assert_eq!(base.version(), None);
        base.set_version("4.028".to_string());
        base.set_version("5.000".to_string());
        assert_eq!(base.version(), Some("4.028"));
    }

    #[test]
    fn test_libraries_are_deduplicated() {
        let base = BuilderBase::new(BuilderConfig::new("/tmp/work"));
        base.register_library(&Library::new("b").unwrap());
        base.register_library(&Library::new("a").unwrap());
        base.register_library(&Library::new("B").unwrap());
        let names: Vec<_> = base.libraries().iter().map(|l| l.name().to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_library_lock_is_shared_per_library() {
        let base = BuilderBase::new(BuilderConfig::new("/tmp/work"));
        let core = Library::new("core").unwrap();
        let first = base.library_lock(&core);
        let second = base.library_lock(&Library::new("CORE").unwrap());
        let other = base.library_lock(&Library::work());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
