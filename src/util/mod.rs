//! Shared utilities

pub mod config;
pub mod process;
pub mod shell;

pub use config::Config;
pub use process::{CancelToken, CommandRunner, ProcessBuilder, ProcessError, ProcessOutput, SystemRunner};
