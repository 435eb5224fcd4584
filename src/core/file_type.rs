//! Source file types and the extension table.
//!
//! The file type drives which builders accept a file and which default
//! flags apply to it.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Kind of HDL source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFileType {
    /// VHDL source (`.vhd`, `.vhdl`)
    Vhdl,
    /// Verilog source (`.v`, `.vh`)
    Verilog,
    /// SystemVerilog source (`.sv`, `.svh`), a superset of Verilog
    #[serde(alias = "sv")]
    SystemVerilog,
}

impl SourceFileType {
    /// All known file types.
    pub const ALL: [SourceFileType; 3] = [
        SourceFileType::Vhdl,
        SourceFileType::Verilog,
        SourceFileType::SystemVerilog,
    ];

    /// Map a bare extension (without the dot) to a file type.
    ///
    /// Matching is case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "vhd" | "vhdl" => Some(SourceFileType::Vhdl),
            "v" | "vh" => Some(SourceFileType::Verilog),
            "sv" | "svh" => Some(SourceFileType::SystemVerilog),
            _ => None,
        }
    }

    /// Determine the file type of a path from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFileType::Vhdl => "vhdl",
            SourceFileType::Verilog => "verilog",
            SourceFileType::SystemVerilog => "systemverilog",
        }
    }
}

impl fmt::Display for SourceFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(SourceFileType::from_extension("vhd"), Some(SourceFileType::Vhdl));
        assert_eq!(SourceFileType::from_extension("vhdl"), Some(SourceFileType::Vhdl));
        assert_eq!(SourceFileType::from_extension("v"), Some(SourceFileType::Verilog));
        assert_eq!(SourceFileType::from_extension("vh"), Some(SourceFileType::Verilog));
        assert_eq!(
            SourceFileType::from_extension("sv"),
            Some(SourceFileType::SystemVerilog)
        );
        assert_eq!(
            SourceFileType::from_extension("svh"),
            Some(SourceFileType::SystemVerilog)
        );
        assert_eq!(SourceFileType::from_extension("c"), None);
    }

    #[test]
    fn test_from_path_is_case_insensitive() {
        assert_eq!(
            SourceFileType::from_path(Path::new("rtl/TOP.SV")),
            Some(SourceFileType::SystemVerilog)
        );
        assert_eq!(
            SourceFileType::from_path(Path::new("pkg.Vhd")),
            Some(SourceFileType::Vhdl)
        );
    }

    #[test]
    fn test_from_path_without_extension() {
        assert_eq!(SourceFileType::from_path(Path::new("Makefile")), None);
        assert_eq!(SourceFileType::from_path(Path::new("")), None);
    }
}
