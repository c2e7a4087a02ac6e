use std::collections::BTreeMap;

use crate::scan::domain::{Ecosystem, PackageRecord, RawFeedFile, UnifiedIndex};

/// Result of merging every available raw feed: one unified index per
/// ecosystem, plus the count of records that had to be skipped.
#[derive(Debug)]
pub struct MergeOutcome {
    pub indexes: BTreeMap<Ecosystem, UnifiedIndex>,
    /// Malformed raw records (missing name or ecosystem) dropped from the
    /// merge. Surfaced as a warning, never fatal.
    pub records_skipped: usize,
}

impl MergeOutcome {
    pub fn total_packages(&self) -> usize {
        self.indexes.values().map(|i| i.total_packages).sum()
    }
}

/// Merges raw per-source record lists into deduplicated per-ecosystem
/// indexes.
///
/// The merge is a commutative, associative fold over `(ecosystem, name)`
/// identities - see [`PackageRecord::merge_raw`] for the per-field rules -
/// so the output is independent of the order feeds are supplied in. One bad
/// record never aborts the run; it is counted and skipped.
pub struct IndexBuilder;

impl IndexBuilder {
    pub fn merge(feeds: &[RawFeedFile]) -> MergeOutcome {
        let mut buckets: BTreeMap<Ecosystem, BTreeMap<String, PackageRecord>> = BTreeMap::new();
        let mut records_skipped = 0usize;

        for feed in feeds {
            for raw in &feed.packages {
                if raw.is_malformed() {
                    records_skipped += 1;
                    continue;
                }

                // Identity: normalized ecosystem + case-insensitive name.
                let ecosystem = Ecosystem::normalize(raw.ecosystem.as_deref().unwrap_or(""));
                let key = raw.name.as_deref().unwrap_or("").to_lowercase();

                let bucket = buckets.entry(ecosystem).or_default();
                match bucket.get_mut(&key) {
                    Some(existing) => existing.merge_raw(raw, &feed.source, feed.collected_at),
                    None => {
                        bucket.insert(
                            key,
                            PackageRecord::from_raw(raw, &feed.source, feed.collected_at),
                        );
                    }
                }
            }
        }

        let indexes = buckets
            .into_iter()
            .map(|(ecosystem, records)| {
                let packages: Vec<PackageRecord> = records.into_values().collect();
                (ecosystem.clone(), UnifiedIndex::assemble(ecosystem, packages))
            })
            .collect();

        MergeOutcome {
            indexes,
            records_skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::domain::{RawPackageRecord, Severity};

    fn feed(source: &str, packages: Vec<RawPackageRecord>) -> RawFeedFile {
        RawFeedFile {
            source: source.to_string(),
            collected_at: Some("2025-11-24T00:00:00Z".parse().unwrap()),
            total_packages: Some(packages.len() as u64),
            ecosystems: Vec::new(),
            packages,
        }
    }

    fn raw(name: &str, ecosystem: &str, versions: &[&str], severity: &str) -> RawPackageRecord {
        RawPackageRecord {
            name: Some(name.to_string()),
            ecosystem: Some(ecosystem.to_string()),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            severity: Some(severity.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_record_per_ecosystem_and_name() {
        let feeds = vec![
            feed("osv", vec![raw("evil-pkg", "npm", &["1.0.0"], "high")]),
            feed("socketdev", vec![raw("Evil-Pkg", "npm", &["1.0.1"], "high")]),
        ];

        let outcome = IndexBuilder::merge(&feeds);
        let npm = &outcome.indexes[&Ecosystem::Npm];
        assert_eq!(npm.total_packages, 1);
        assert_eq!(npm.total_versions, 2);
    }

    #[test]
    fn test_two_sources_same_package_severity_and_sources() {
        // Scenario D: high + critical for the same key merges to critical
        // with both source ids attributed.
        let feeds = vec![
            feed("osv", vec![raw("evil-pkg", "npm", &["1.0.0"], "high")]),
            feed(
                "socketdev",
                vec![raw("evil-pkg", "npm", &["1.0.0"], "critical")],
            ),
        ];

        let outcome = IndexBuilder::merge(&feeds);
        let record = &outcome.indexes[&Ecosystem::Npm].packages[0];
        assert_eq!(record.severity, Severity::Critical);
        let sources: Vec<&str> = record.sources.iter().map(String::as_str).collect();
        assert_eq!(sources, vec!["osv", "socketdev"]);
    }

    #[test]
    fn test_ecosystem_labels_merge_into_one_bucket() {
        // Scenario E: "Node.js" and "npm" label the same bucket.
        let feeds = vec![
            feed("osv", vec![raw("evil-pkg", "Node.js", &["1.0.0"], "high")]),
            feed("phylum", vec![raw("evil-pkg", "npm", &["1.0.0"], "high")]),
        ];

        let outcome = IndexBuilder::merge(&feeds);
        assert_eq!(outcome.indexes.len(), 1);
        assert!(outcome.indexes.contains_key(&Ecosystem::Npm));
        assert_eq!(outcome.indexes[&Ecosystem::Npm].total_packages, 1);
    }

    #[test]
    fn test_malformed_records_skipped_not_fatal() {
        let nameless = RawPackageRecord {
            ecosystem: Some("npm".to_string()),
            ..Default::default()
        };
        let ecosystemless = RawPackageRecord {
            name: Some("x".to_string()),
            ..Default::default()
        };
        let feeds = vec![feed(
            "osv",
            vec![nameless, ecosystemless, raw("ok", "npm", &["1.0.0"], "low")],
        )];

        let outcome = IndexBuilder::merge(&feeds);
        assert_eq!(outcome.records_skipped, 2);
        assert_eq!(outcome.indexes[&Ecosystem::Npm].total_packages, 1);
    }

    #[test]
    fn test_merge_is_independent_of_feed_order() {
        let a = feed("osv", vec![raw("evil-pkg", "npm", &["1.0.0"], "high")]);
        let b = feed(
            "socketdev",
            vec![raw("evil-pkg", "Node.js", &["2.0.0"], "critical")],
        );

        let forward = IndexBuilder::merge(&[a.clone(), b.clone()]);
        let reverse = IndexBuilder::merge(&[b, a]);

        assert_eq!(forward.indexes, reverse.indexes);
    }

    #[test]
    fn test_unknown_ecosystem_still_tracked() {
        let feeds = vec![feed("osv", vec![raw("weird", "Hackage", &["0.1"], "low")])];
        let outcome = IndexBuilder::merge(&feeds);
        let key = Ecosystem::Other("hackage".to_string());
        assert_eq!(outcome.indexes[&key].total_packages, 1);
    }

    #[test]
    fn test_packages_sorted_by_name() {
        let feeds = vec![feed(
            "osv",
            vec![
                raw("zeta", "npm", &["1.0.0"], "low"),
                raw("alpha", "npm", &["1.0.0"], "low"),
            ],
        )];
        let outcome = IndexBuilder::merge(&feeds);
        let names: Vec<&str> = outcome.indexes[&Ecosystem::Npm]
            .packages
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
