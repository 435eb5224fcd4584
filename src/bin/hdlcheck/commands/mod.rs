//! Command implementations

pub mod build;
pub mod builders;
pub mod completions;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use hdlcheck::builder::{BuilderConfig, BuilderKind, EventSink};
use hdlcheck::util::config::{global_config_path, load_config, project_config_path, Config};
use hdlcheck::util::process::find_executable;

/// Work folder used when neither the command line nor the config sets one.
pub const DEFAULT_WORK_DIR: &str = ".hdlcheck/work";

/// Load the merged global and project configuration for `cwd`.
pub fn load_project_config(cwd: &Path) -> Config {
    load_config(global_config_path().as_deref(), &project_config_path(cwd))
}

/// Current working directory.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("failed to get current directory")
}

/// Builder configuration for one variant.
///
/// Tool path precedence: explicit path, then the config file, then a PATH
/// lookup of the default binary.
pub fn builder_config(
    kind: BuilderKind,
    config: &Config,
    work_dir: &Path,
    explicit_tool: Option<&Path>,
    events: Arc<dyn EventSink>,
) -> BuilderConfig {
    let mut builder_config = BuilderConfig::new(work_dir).events(events);

    let tool = explicit_tool
        .map(Path::to_path_buf)
        .or_else(|| config.builder_settings(kind).and_then(|s| s.path.clone()))
        .or_else(|| kind.binary().and_then(find_executable));
    if let Some(tool) = tool {
        builder_config = builder_config.tool_path(tool);
    }

    if let Some(timeout) = config.timeout() {
        builder_config = builder_config.timeout(timeout);
    }

    builder_config
}
