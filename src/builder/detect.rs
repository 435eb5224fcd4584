//! Builder variants and auto-detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Builder, BuilderConfig, Fallback, Ghdl, Verilator};

/// The closed set of builder variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
    Verilator,
    Ghdl,
    Fallback,
}

impl BuilderKind {
    /// Every variant, in detection order.
    pub const ALL: [BuilderKind; 3] = [BuilderKind::Verilator, BuilderKind::Ghdl, BuilderKind::Fallback];

    /// Builder name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::Verilator => "verilator",
            BuilderKind::Ghdl => "ghdl",
            BuilderKind::Fallback => "fallback",
        }
    }

    /// Default executable name. The fallback runs nothing.
    pub fn binary(&self) -> Option<&'static str> {
        match self {
            BuilderKind::Verilator => Some("verilator"),
            BuilderKind::Ghdl => Some("ghdl"),
            BuilderKind::Fallback => None,
        }
    }

    /// Instantiate this variant.
    pub fn create(self, config: BuilderConfig) -> Box<dyn Builder> {
        match self {
            BuilderKind::Verilator => Box::new(Verilator::new(config)),
            BuilderKind::Ghdl => Box::new(Ghdl::new(config)),
            BuilderKind::Fallback => Box::new(Fallback::new(config)),
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuilderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verilator" => Ok(BuilderKind::Verilator),
            "ghdl" => Ok(BuilderKind::Ghdl),
            "fallback" | "none" => Ok(BuilderKind::Fallback),
            _ => Err(format!(
                "unknown builder '{}'; expected one of: verilator, ghdl, fallback",
                s
            )),
        }
    }
}

/// Pick the first available real builder, or the fallback.
///
/// `config_for` supplies the configuration for each variant tried, so
/// callers can give every tool its own path.
pub fn detect_builder(config_for: impl Fn(BuilderKind) -> BuilderConfig) -> Box<dyn Builder> {
    for kind in [BuilderKind::Verilator, BuilderKind::Ghdl] {
        let builder = kind.create(config_for(kind));
        if builder.is_available() {
            tracing::debug!("detected builder {}", kind);
            return builder;
        }
    }

    tracing::debug!("no HDL tool found, using the fallback builder");
    BuilderKind::Fallback.create(config_for(BuilderKind::Fallback))
}
