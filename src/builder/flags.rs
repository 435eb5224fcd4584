//! Build flag scopes and per-builder default flag tables.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::file_type::SourceFileType;

/// Where a set of flags applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildFlagScope {
    /// Compiling exactly one file in isolation
    #[default]
    Single,
    /// Compiling a file as part of a larger set or library build
    All,
}

impl BuildFlagScope {
    /// Get the scope name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildFlagScope::Single => "single",
            BuildFlagScope::All => "all",
        }
    }
}

impl fmt::Display for BuildFlagScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildFlagScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(BuildFlagScope::Single),
            "all" => Ok(BuildFlagScope::All),
            _ => Err(format!(
                "invalid flag scope '{}'; expected 'single' or 'all'",
                s
            )),
        }
    }
}

/// Default flags a builder declares per `(scope, file type)`.
///
/// Tokens are normalized on insertion: every token is split on whitespace
/// and empty pieces are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTable {
    entries: BTreeMap<(BuildFlagScope, SourceFileType), Vec<String>>,
}

impl FlagTable {
    /// Create an empty table.
    pub fn new() -> Self {
        FlagTable::default()
    }

    /// Set the defaults for one `(scope, file type)` pair.
    pub fn with<I, S>(mut self, scope: BuildFlagScope, file_type: SourceFileType, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries
            .insert((scope, file_type), normalize_flags(flags));
        self
    }

    /// Set the same defaults for a file type in every scope.
    pub fn with_all_scopes<I, S>(self, file_type: SourceFileType, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let flags = normalize_flags(flags);
        self.with(BuildFlagScope::Single, file_type, &flags)
            .with(BuildFlagScope::All, file_type, &flags)
    }

    /// Default flags for a pair. Missing entries are empty.
    pub fn defaults(&self, scope: BuildFlagScope, file_type: SourceFileType) -> &[String] {
        self.entries
            .get(&(scope, file_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Compute the effective flags: defaults first, then caller flags.
    ///
    /// Caller flags are trimmed and empty ones dropped, but otherwise passed
    /// through untouched.
    pub fn resolve(
        &self,
        scope: BuildFlagScope,
        file_type: SourceFileType,
        caller_flags: &[String],
    ) -> Vec<String> {
        let mut flags = self.defaults(scope, file_type).to_vec();
        flags.extend(
            caller_flags
                .iter()
                .map(|f| f.trim())
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        );
        flags
    }
}

/// Split every token on whitespace and drop empties.
pub fn normalize_flags<I, S>(flags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    flags
        .into_iter()
        .flat_map(|f| {
            f.as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
