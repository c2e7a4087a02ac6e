use std::collections::BTreeMap;

use serde::Deserialize;

use crate::scan::domain::{Ecosystem, PackageRecord, RawPackageRecord, UnifiedIndex};
use crate::shared::Result;

/// The active known-bad package set for a scan, indexed by
/// (ecosystem, lowercased name) for O(log n) lookup.
///
/// Built either from unified index files or, when those are unavailable,
/// from the bundled fallback dataset. Read-only once constructed.
#[derive(Debug, Default)]
pub struct PackageDatabase {
    records: BTreeMap<(Ecosystem, String), PackageRecord>,
}

/// Schema of the bundled `affected_packages.yaml` fallback dataset.
#[derive(Debug, Deserialize)]
struct AffectedPackagesFile {
    affected_packages: Vec<AffectedPackage>,
}

#[derive(Debug, Deserialize)]
struct AffectedPackage {
    name: String,
    #[serde(default)]
    versions: Vec<String>,
}

impl PackageDatabase {
    pub fn empty() -> PackageDatabase {
        PackageDatabase::default()
    }

    /// Builds the database from unified per-ecosystem indexes.
    pub fn from_indexes(indexes: Vec<UnifiedIndex>) -> PackageDatabase {
        let mut db = PackageDatabase::empty();
        for index in indexes {
            for record in index.packages {
                db.insert(index.ecosystem.clone(), record);
            }
        }
        db
    }

    /// Parses the worm-campaign fallback dataset (npm only). Each entry
    /// becomes a critical record attributed to the `shai-hulud` source.
    pub fn from_affected_packages_yaml(content: &str) -> Result<PackageDatabase> {
        let file: AffectedPackagesFile = serde_yaml_ng::from_str(content)?;
        let mut db = PackageDatabase::empty();
        for package in file.affected_packages {
            db.insert(
                Ecosystem::Npm,
                fallback_record(&package.name, &package.versions),
            );
        }
        Ok(db)
    }

    /// The minimal built-in record set, used when neither the unified index
    /// nor the bundled dataset can be loaded. Keeps a scan from ever being
    /// blocked by a missing database.
    pub fn builtin_fallback() -> PackageDatabase {
        let mut db = PackageDatabase::empty();
        db.insert(
            Ecosystem::Npm,
            fallback_record("@ctrl/deluge", &["7.2.2".to_string(), "7.2.1".to_string()]),
        );
        db.insert(
            Ecosystem::Npm,
            fallback_record(
                "ngx-bootstrap",
                &[
                    "18.1.4".to_string(),
                    "19.0.3".to_string(),
                    "19.0.4".to_string(),
                    "20.0.3".to_string(),
                    "20.0.4".to_string(),
                    "20.0.5".to_string(),
                    "20.0.6".to_string(),
                ],
            ),
        );
        db
    }

    pub fn insert(&mut self, ecosystem: Ecosystem, record: PackageRecord) {
        let key = (ecosystem, record.name.to_lowercase());
        self.records.insert(key, record);
    }

    /// Looks up the single record for (ecosystem, name), case-insensitive
    /// on the name.
    pub fn lookup(&self, ecosystem: &Ecosystem, name: &str) -> Option<&PackageRecord> {
        self.records
            .get(&(ecosystem.clone(), name.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn fallback_record(name: &str, versions: &[String]) -> PackageRecord {
    let raw = RawPackageRecord {
        name: Some(name.to_string()),
        ecosystem: Some("npm".to_string()),
        versions: versions.to_vec(),
        severity: Some("critical".to_string()),
        description: Some(format!("Shai-Hulud compromised package: {name}")),
        detected_behaviors: vec![
            "supply_chain_attack".to_string(),
            "malicious_code".to_string(),
        ],
        ..Default::default()
    };
    PackageRecord::from_raw(&raw, "shai-hulud", None)
}
