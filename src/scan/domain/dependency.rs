use serde::Serialize;

use crate::scan::domain::ecosystem::Ecosystem;
use crate::scan::domain::package_record::PackageRecord;

/// One dependency as declared in a manifest or resolved in a lockfile.
/// Ephemeral - produced per scan, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDependency {
    pub ecosystem: Ecosystem,
    pub name: String,
    /// Version with semver range prefixes already stripped; may be empty
    /// for manifests that declare a bare name.
    pub version: String,
    /// Where the dependency was declared, e.g. `dependencies` or
    /// `lockfile (depth 2)`.
    pub location: String,
}

impl InstalledDependency {
    pub fn new(
        ecosystem: Ecosystem,
        name: impl Into<String>,
        version: impl Into<String>,
        location: impl Into<String>,
    ) -> InstalledDependency {
        InstalledDependency {
            ecosystem,
            name: name.into(),
            version: version.into(),
            location: location.into(),
        }
    }
}

/// Classification of an installed dependency against the known-bad database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Installed version is in the known-compromised version set.
    Exact,
    /// Package name is tracked as compromised, but this version is not in
    /// the known-bad set.
    Potential,
}

/// An installed dependency paired with the database record it matched.
#[derive(Debug, Clone)]
pub struct PackageMatch {
    pub dependency: InstalledDependency,
    pub record: PackageRecord,
    pub kind: MatchKind,
}
