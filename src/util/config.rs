//! Configuration file support for hdlcheck.
//!
//! hdlcheck supports two configuration file locations:
//! - Global: `~/.hdlcheck/config.toml` - User-wide defaults
//! - Project: `.hdlcheck/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::{BuildFlagScope, BuilderKind};
use crate::core::library::Library;

/// Name of the configuration directory, both global and per project.
pub const CONFIG_DIR: &str = ".hdlcheck";

/// hdlcheck configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Per-builder settings, keyed by builder name
    pub builders: BTreeMap<String, BuilderSettings>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Work folder root
    pub work_dir: Option<PathBuf>,

    /// Default target library
    pub library: Option<Library>,

    /// Per-invocation timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Builder to use (verilator, ghdl, fallback); auto-detected when unset
    pub builder: Option<String>,

    /// Default flag scope
    pub scope: Option<BuildFlagScope>,

    /// Default number of parallel jobs (None = auto-detect)
    pub jobs: Option<usize>,
}

/// Settings for one builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Path to the tool binary
    pub path: Option<PathBuf>,

    /// Extra flags appended after the builder's defaults
    pub flags: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.work_dir.is_some() {
            self.build.work_dir = other.build.work_dir;
        }
        if other.build.library.is_some() {
            self.build.library = other.build.library;
        }
        if other.build.timeout_secs.is_some() {
            self.build.timeout_secs = other.build.timeout_secs;
        }
        if other.build.builder.is_some() {
            self.build.builder = other.build.builder;
        }
        if other.build.scope.is_some() {
            self.build.scope = other.build.scope;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }

        for (name, settings) in other.builders {
            let entry = self.builders.entry(name).or_default();
            if settings.path.is_some() {
                entry.path = settings.path;
            }
            // Flags are replaced, not concatenated
            if !settings.flags.is_empty() {
                entry.flags = settings.flags;
            }
        }
    }

    /// Parse the configured builder.
    pub fn builder(&self) -> Option<BuilderKind> {
        let name = self.build.builder.as_ref()?;
        match name.parse() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!("ignoring configured builder: {}", e);
                None
            }
        }
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.build.timeout_secs.map(Duration::from_secs)
    }

    /// Settings for a builder, if any were configured.
    pub fn builder_settings(&self, kind: BuilderKind) -> Option<&BuilderSettings> {
        self.builders.get(kind.as_str())
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.hdlcheck/config.toml)
/// 2. Global config (~/.hdlcheck/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global hdlcheck config directory (~/.hdlcheck).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (~/.hdlcheck/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.hdlcheck/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.build.work_dir.is_none());
        assert!(config.builders.is_empty());
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
work_dir = ".hdlcheck/work"
library = "Core"
timeout_secs = 30
builder = "ghdl"
scope = "all"
jobs = 4

[builders.ghdl]
path = "/opt/ghdl/bin/ghdl"
flags = ["--std=08"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.work_dir, Some(PathBuf::from(".hdlcheck/work")));
        assert_eq!(config.build.library, Some(Library::new("core").unwrap()));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.builder(), Some(BuilderKind::Ghdl));
        assert_eq!(config.build.scope, Some(BuildFlagScope::All));
        assert_eq!(config.build.jobs, Some(4));

        let ghdl = config.builder_settings(BuilderKind::Ghdl).unwrap();
        assert_eq!(ghdl.path, Some(PathBuf::from("/opt/ghdl/bin/ghdl")));
        assert_eq!(ghdl.flags, vec!["--std=08"]);
        assert!(config.builder_settings(BuilderKind::Verilator).is_none());
    }

    #[test]
    fn test_invalid_library_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build]\nlibrary = \"9lives\"\n").unwrap();

        assert!(Config::load(&config_path).is_err());
        assert_eq!(Config::load_or_default(&config_path), Config::default());
    }

    #[test]
    fn test_unknown_builder_is_ignored() {
        let mut config = Config::default();
        config.build.builder = Some("modelsim".to_string());
        assert_eq!(config.builder(), None);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.build.builder = Some("verilator".to_string());
        base.build.jobs = Some(4);
        base.builders.insert(
            "verilator".to_string(),
            BuilderSettings {
                path: Some(PathBuf::from("/usr/bin/verilator")),
                flags: vec!["-Wno-fatal".to_string()],
            },
        );

        let mut override_cfg = Config::default();
        override_cfg.build.builder = Some("ghdl".to_string());
        override_cfg.builders.insert(
            "verilator".to_string(),
            BuilderSettings {
                path: None,
                flags: vec!["-Wall".to_string()],
            },
        );

        base.merge(override_cfg);

        assert_eq!(base.build.builder, Some("ghdl".to_string()));
        assert_eq!(base.build.jobs, Some(4)); // Not overridden
        let verilator = &base.builders["verilator"];
        assert_eq!(verilator.path, Some(PathBuf::from("/usr/bin/verilator")));
        assert_eq!(verilator.flags, vec!["-Wall"]);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = project_config_path(tmp.path());
        std::fs::create_dir_all(project_path.parent().unwrap()).unwrap();

        std::fs::write(&global_path, "[build]\ntimeout_secs = 10\njobs = 2\n").unwrap();
        std::fs::write(&project_path, "[build]\ntimeout_secs = 60\n").unwrap();

        let config = load_config(Some(&global_path), &project_path);
        assert_eq!(config.build.timeout_secs, Some(60));
        assert_eq!(config.build.jobs, Some(2));
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("nope.toml"));
        assert_eq!(config, Config::default());
    }
}
