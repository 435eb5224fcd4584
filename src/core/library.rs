//! Library names.
//!
//! A library is a named compilation namespace. Names follow VHDL identifier
//! rules: they are case-insensitive and stored lower-cased.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The library used when none is given.
pub const DEFAULT_LIBRARY: &str = "work";

/// A validated library name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Library(String);

/// Error returned when parsing an invalid library name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid library name '{0}': expected a letter followed by letters, digits or '_'")]
pub struct LibraryNameError(pub String);

impl Library {
    /// Create a library from a name, validating and normalizing it.
    pub fn new(name: &str) -> Result<Self, LibraryNameError> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(first) => {
                first.is_ascii_alphabetic()
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };

        if !valid {
            return Err(LibraryNameError(name.to_string()));
        }

        Ok(Library(name.to_ascii_lowercase()))
    }

    /// The default `work` library.
    pub fn work() -> Self {
        Library(DEFAULT_LIBRARY.to_string())
    }

    /// Get the normalized name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Library {
    fn default() -> Self {
        Library::work()
    }
}

impl FromStr for Library {
    type Err = LibraryNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Library::new(s)
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Library {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Library {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Library {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Library::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_is_lowercased() {
        let lib = Library::new("MyLib_2").unwrap();
        assert_eq!(lib.name(), "mylib_2");
        assert_eq!(lib, Library::new("mylib_2").unwrap());
    }

    #[test]
    fn test_invalid_names() {
        assert!(Library::new("").is_err());
        assert!(Library::new("2lib").is_err());
        assert!(Library::new("lib-name").is_err());
        assert!(Library::new("../escape").is_err());
        assert!(Library::new("a b").is_err());
    }

    #[test]
    fn test_default_is_work() {
        assert_eq!(Library::default().name(), "work");
        assert_eq!("WORK".parse::<Library>().unwrap(), Library::work());
    }

    #[test]
    fn test_deserialize_validates() {
        let lib: Library = serde_json::from_str("\"Ieee\"").unwrap();
        assert_eq!(lib.name(), "ieee");
        assert!(serde_json::from_str::<Library>("\"no way\"").is_err());
    }
}
