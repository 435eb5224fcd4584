//! hdlcheck - Uniform front end for HDL compilers and linters
//!
//! This crate wraps external HDL tools (Verilator, GHDL) behind one
//! [`Builder`] interface: probe the tool, create libraries in a work
//! folder, build a source file and get back normalized diagnostics.

pub mod builder;
pub mod core;
pub mod util;

/// Test utilities and mocks for hdlcheck unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a mock command runner and canned tool output.
#[cfg(test)]
pub mod test_support;

pub use builder::{
    detect_builder, BuildFlagScope, BuildOptions, Builder, BuilderConfig, BuilderError,
    BuilderKind, BuilderState,
};
pub use core::{Diagnostic, Library, Severity, SourceFileType, WorkFolder};
pub use util::process::CancelToken;
