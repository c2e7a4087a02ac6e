use serde::{Deserialize, Serialize};
use std::fmt;

/// A package registry/language domain.
///
/// Canonical identifiers are fixed; free-text labels from threat feeds
/// ("Node.js", "PyPI", "crates.io", ...) normalize onto them through
/// [`Ecosystem::normalize`]. Labels outside the alias table pass through
/// lower-cased as [`Ecosystem::Other`] so unrecognized ecosystems are still
/// tracked distinctly instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Ecosystem {
    Npm,
    PyPi,
    RubyGems,
    Go,
    Maven,
    Cargo,
    NuGet,
    Other(String),
}

impl Ecosystem {
    /// All canonical ecosystems a unified index is built for.
    pub const KNOWN: [Ecosystem; 7] = [
        Ecosystem::Npm,
        Ecosystem::PyPi,
        Ecosystem::RubyGems,
        Ecosystem::Go,
        Ecosystem::Maven,
        Ecosystem::Cargo,
        Ecosystem::NuGet,
    ];

    /// Normalizes a free-text ecosystem label to its canonical identifier.
    ///
    /// The mapping is case-insensitive and total: every input produces an
    /// ecosystem, and `normalize(normalize(x).as_str()) == normalize(x)`.
    pub fn normalize(label: &str) -> Ecosystem {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "npm" | "node" | "nodejs" | "node.js" | "javascript" | "js" => Ecosystem::Npm,
            "pypi" | "python" | "pip" | "py" => Ecosystem::PyPi,
            "rubygems" | "ruby" | "gem" | "gems" => Ecosystem::RubyGems,
            "go" | "golang" => Ecosystem::Go,
            "maven" | "java" | "mvn" => Ecosystem::Maven,
            "cargo" | "crates" | "rust" | "crates.io" => Ecosystem::Cargo,
            "nuget" | "dotnet" | ".net" => Ecosystem::NuGet,
            _ => Ecosystem::Other(label),
        }
    }

    /// The canonical identifier used in index filenames and reports.
    pub fn as_str(&self) -> &str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::PyPi => "pypi",
            Ecosystem::RubyGems => "rubygems",
            Ecosystem::Go => "go",
            Ecosystem::Maven => "maven",
            Ecosystem::Cargo => "cargo",
            Ecosystem::NuGet => "nuget",
            Ecosystem::Other(label) => label,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Ecosystem {
    fn from(label: String) -> Self {
        Ecosystem::normalize(&label)
    }
}

impl From<Ecosystem> for String {
    fn from(ecosystem: Ecosystem) -> Self {
        ecosystem.as_str().to_string()
    }
}
