//! The builder-owned work folder.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::core::library::Library;

/// Directory holding per-library build state for one builder instance.
///
/// Each library maps to `<root>/<library>`. Nothing under the work folder is
/// ever removed by the builder; cleaning is left to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkFolder {
    root: PathBuf,
}

impl WorkFolder {
    /// Create a work folder rooted at `root`. Nothing is created on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkFolder { root: root.into() }
    }

    /// Path a library maps to.
    pub fn library_path(&self, library: &Library) -> PathBuf {
        self.root.join(library.name())
    }

    /// Ensure the directory for `library` exists.
    ///
    /// Returns `Ok(true)` when this call created the directory and
    /// `Ok(false)` when it already existed, including when a concurrent
    /// caller created it between the check and the create.
    pub fn ensure_library(&self, library: &Library) -> io::Result<bool> {
        let path = self.library_path(library);

        if path.is_dir() {
            return Ok(false);
        }

        if path.exists() && !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists but is not a directory", path.display()),
            ));
        }

        if let Err(e) = fs::create_dir_all(&self.root) {
            if !self.root.is_dir() {
                return Err(e);
            }
        }

        match fs::create_dir(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
