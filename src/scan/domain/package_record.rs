use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::scan::domain::raw_feed::RawPackageRecord;
use crate::scan::domain::severity::Severity;

/// Source-specific metadata retained per contributing feed (advisory URL,
/// the severity label exactly as that feed reported it, its description).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDetail {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One deduplicated package entry in the unified index, keyed by
/// (ecosystem, lowercased name) in the surrounding map.
///
/// Ordered collections (`BTreeSet`/`BTreeMap`) are deliberate: they make the
/// merge fold order-independent and keep serialized output stable across
/// rebuilds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub versions: BTreeSet<String>,
    pub severity: Severity,
    pub sources: BTreeSet<String>,
    #[serde(default)]
    pub first_seen: Option<NaiveDate>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub detected_behaviors: BTreeSet<String>,
    #[serde(default)]
    pub source_details: BTreeMap<String, SourceDetail>,
    /// Stamp of the feed whose description currently wins; bookkeeping for
    /// the merge fold only, never serialized.
    #[serde(skip)]
    description_stamp: Option<(Option<DateTime<Utc>>, String)>,
}

impl PackageRecord {
    /// Seeds a record from the first raw report of this package.
    pub fn from_raw(
        raw: &RawPackageRecord,
        source: &str,
        collected_at: Option<DateTime<Utc>>,
    ) -> PackageRecord {
        let mut record = PackageRecord {
            name: raw.name.clone().unwrap_or_default(),
            versions: BTreeSet::new(),
            severity: Severity::parse(raw.severity.as_deref().unwrap_or("")),
            sources: BTreeSet::new(),
            first_seen: raw.first_seen_date(),
            last_updated: collected_at,
            description: String::new(),
            detected_behaviors: BTreeSet::new(),
            source_details: BTreeMap::new(),
            description_stamp: None,
        };
        record.absorb(raw, source, collected_at);
        record
    }

    /// Merges one more raw report into this record.
    ///
    /// Every rule here is commutative and associative over the set of input
    /// records, so the unified index does not depend on the order feeds are
    /// supplied:
    /// - versions / sources / behaviors: set union
    /// - severity: ordinal max
    /// - first_seen: min by date value, last_updated: max by timestamp
    /// - description: latest-stamped non-empty report wins, source id breaks
    ///   timestamp ties
    pub fn merge_raw(
        &mut self,
        raw: &RawPackageRecord,
        source: &str,
        collected_at: Option<DateTime<Utc>>,
    ) {
        self.severity = self
            .severity
            .max(Severity::parse(raw.severity.as_deref().unwrap_or("")));

        if let Some(incoming) = raw.first_seen_date() {
            self.first_seen = Some(match self.first_seen {
                Some(existing) => existing.min(incoming),
                None => incoming,
            });
        }
        if let Some(incoming) = collected_at {
            self.last_updated = Some(match self.last_updated {
                Some(existing) => existing.max(incoming),
                None => incoming,
            });
        }

        if let Some(incoming) = raw.name.as_deref() {
            if !incoming.is_empty() && (self.name.is_empty() || incoming < self.name.as_str()) {
                self.name = incoming.to_string();
            }
        }

        self.absorb(raw, source, collected_at);
    }

    /// The shared per-report portion of seeding and merging.
    fn absorb(
        &mut self,
        raw: &RawPackageRecord,
        source: &str,
        collected_at: Option<DateTime<Utc>>,
    ) {
        self.versions.extend(raw.versions.iter().cloned());
        self.sources.insert(source.to_string());
        self.detected_behaviors
            .extend(raw.detected_behaviors.iter().cloned());

        self.source_details.insert(
            source.to_string(),
            SourceDetail {
                severity: raw.severity.clone(),
                url: raw.source_url.clone(),
                description: raw.description.clone(),
            },
        );

        if let Some(description) = raw.description.as_deref() {
            if !description.is_empty() {
                let stamp = (collected_at, source.to_string());
                let wins = match &self.description_stamp {
                    None => true,
                    Some(existing) => stamp > *existing,
                };
                if self.description.is_empty() || wins {
                    self.description = description.to_string();
                    self.description_stamp = Some(stamp);
                }
            }
        }
    }
}
