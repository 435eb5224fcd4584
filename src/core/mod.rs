//! Core data structures for hdlcheck.
//!
//! This module contains the foundational types shared by every builder:
//! - Source file types and their extension table
//! - Library names and the on-disk work folder
//! - Diagnostics reported by the tools

pub mod diagnostic;
pub mod file_type;
pub mod library;
pub mod work_folder;

pub use diagnostic::{Diagnostic, Severity};
pub use file_type::SourceFileType;
pub use library::{Library, LibraryNameError, DEFAULT_LIBRARY};
pub use work_folder::WorkFolder;
