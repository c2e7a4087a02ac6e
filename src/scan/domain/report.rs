use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::scan::domain::dependency::{MatchKind, PackageMatch};
use crate::scan::domain::ioc::IocFinding;
use crate::scan::domain::severity::Severity;

/// One matched package as it appears in the report's `malicious_packages`
/// list - the record flattened together with where and how it matched.
#[derive(Debug, Clone, Serialize)]
pub struct MaliciousPackageEntry {
    pub name: String,
    pub version: String,
    #[serde(rename = "match")]
    pub match_kind: MatchKind,
    pub location: String,
    pub severity: Severity,
    pub sources: Vec<String>,
    pub description: String,
    pub detected_behaviors: Vec<String>,
    pub affected_versions: Vec<String>,
}

impl From<&PackageMatch> for MaliciousPackageEntry {
    fn from(m: &PackageMatch) -> MaliciousPackageEntry {
        MaliciousPackageEntry {
            name: m.dependency.name.clone(),
            version: m.dependency.version.clone(),
            match_kind: m.kind,
            location: m.dependency.location.clone(),
            severity: m.record.severity,
            sources: m.record.sources.iter().cloned().collect(),
            description: m.record.description.clone(),
            detected_behaviors: m.record.detected_behaviors.iter().cloned().collect(),
            affected_versions: m.record.versions.iter().cloned().collect(),
        }
    }
}

/// Non-fatal trouble encountered during a scan. Every swallowed error
/// increments one of these counters; nothing disappears silently.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanWarnings {
    /// Manifest/lockfile files that could not be read or parsed.
    pub input_errors: usize,
    /// Subtrees or files skipped during the IoC walk.
    pub walk_errors: usize,
    /// True when the unified index could not be loaded and the scan ran
    /// against the bundled fallback record set.
    pub database_fallback: bool,
}

/// The aggregate result of one scan invocation, serialized as the report
/// JSON and discarded afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_timestamp: String,
    /// Canonical ecosystem id, comma-joined when several were scanned.
    pub ecosystem: String,
    pub scanned_path: String,
    pub total_packages_scanned: usize,
    pub malicious_packages_found: usize,
    pub iocs_found: usize,
    pub malicious_packages: Vec<MaliciousPackageEntry>,
    pub iocs: Vec<IocFinding>,
    pub warnings: ScanWarnings,
}

impl ScanReport {
    pub fn new(
        timestamp: DateTime<Utc>,
        ecosystem: String,
        scanned_path: String,
        total_packages_scanned: usize,
        matches: &[PackageMatch],
        iocs: Vec<IocFinding>,
        warnings: ScanWarnings,
    ) -> ScanReport {
        let malicious_packages: Vec<MaliciousPackageEntry> =
            matches.iter().map(MaliciousPackageEntry::from).collect();

        ScanReport {
            scan_timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            ecosystem,
            scanned_path,
            total_packages_scanned,
            malicious_packages_found: malicious_packages.len(),
            iocs_found: iocs.len(),
            malicious_packages,
            iocs,
            warnings,
        }
    }

    /// True when anything warranting a non-zero exit was found: an
    /// exact-match package or any IoC. Potential matches are reported but
    /// never gate CI on their own.
    pub fn has_findings(&self) -> bool {
        self.has_exact_matches() || self.iocs_found > 0
    }

    /// True when at least one match is an exact version hit.
    pub fn has_exact_matches(&self) -> bool {
        self.malicious_packages
            .iter()
            .any(|p| p.match_kind == MatchKind::Exact)
    }

    pub fn to_json(&self) -> crate::shared::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
