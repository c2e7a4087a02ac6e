use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::domain::ecosystem::Ecosystem;
use crate::scan::domain::package_record::PackageRecord;

/// The deduplicated, source-attributed record set for one ecosystem - the
/// payload of a `final-data/unified_{ecosystem}.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedIndex {
    pub ecosystem: Ecosystem,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    pub total_packages: usize,
    pub total_versions: usize,
    pub sources: Vec<String>,
    pub packages: Vec<PackageRecord>,
}

impl UnifiedIndex {
    /// Assembles an index from merged records, computing the totals and the
    /// sorted contributing-source list. Records arrive sorted by name from
    /// the builder's ordered map.
    pub fn assemble(ecosystem: Ecosystem, packages: Vec<PackageRecord>) -> UnifiedIndex {
        let total_versions = packages.iter().map(|p| p.versions.len()).sum();
        let last_updated = packages.iter().filter_map(|p| p.last_updated).max();

        let mut sources: Vec<String> = packages
            .iter()
            .flat_map(|p| p.sources.iter().cloned())
            .collect();
        sources.sort();
        sources.dedup();

        UnifiedIndex {
            ecosystem,
            last_updated,
            total_packages: packages.len(),
            total_versions,
            sources,
            packages,
        }
    }

    /// An index with no packages, still written out so consumers can tell
    /// "ecosystem checked, nothing known" from "ecosystem never built".
    pub fn empty(ecosystem: Ecosystem) -> UnifiedIndex {
        UnifiedIndex::assemble(ecosystem, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::domain::raw_feed::RawPackageRecord;

    fn record(name: &str, versions: &[&str], source: &str) -> PackageRecord {
        let raw = RawPackageRecord {
            name: Some(name.to_string()),
            ecosystem: Some("npm".to_string()),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        };
        PackageRecord::from_raw(&raw, source, None)
    }

    #[test]
    fn test_assemble_totals() {
        let index = UnifiedIndex::assemble(
            Ecosystem::Npm,
            vec![
                record("a", &["1.0.0", "1.0.1"], "osv"),
                record("b", &["2.0.0"], "socketdev"),
            ],
        );

        assert_eq!(index.total_packages, 2);
        assert_eq!(index.total_versions, 3);
        assert_eq!(index.sources, vec!["osv", "socketdev"]);
    }

    #[test]
    fn test_empty_index() {
        let index = UnifiedIndex::empty(Ecosystem::Cargo);
        assert_eq!(index.total_packages, 0);
        assert_eq!(index.total_versions, 0);
        assert!(index.sources.is_empty());
        assert!(index.last_updated.is_none());
    }
}
