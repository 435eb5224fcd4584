//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use hdlcheck::builder::{BuildFlagScope, BuilderKind};
use hdlcheck::core::Library;

/// hdlcheck - Run HDL compilers and linters and report uniform diagnostics
#[derive(Parser)]
#[command(name = "hdlcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build source files and report their diagnostics
    Build(BuildArgs),

    /// List the known builders and whether their tools are installed
    Builders(BuildersArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MessageFormat {
    /// Human-readable diagnostics
    #[default]
    Human,
    /// One JSON record per line
    Json,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source files to build
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Builder to use (verilator, ghdl, fallback); auto-detected by default
    #[arg(short, long)]
    pub builder: Option<BuilderKind>,

    /// Library to build into
    #[arg(short, long)]
    pub library: Option<Library>,

    /// Flag scope (single, all)
    #[arg(long)]
    pub scope: Option<BuildFlagScope>,

    /// Work folder root
    #[arg(long, env = "HDLCHECK_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Extra flag passed to the tool (repeatable)
    #[arg(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// Timeout per tool invocation, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Path to the tool binary (requires a builder to be chosen)
    #[arg(long)]
    pub tool_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct BuildersArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
