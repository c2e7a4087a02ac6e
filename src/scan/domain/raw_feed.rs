use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// One raw per-source feed file (`raw-data/{source}.json`), exactly as the
/// collector that produced it wrote it. Read-only input to the index builder.
///
/// Every field except `source` tolerates absence: collectors fail
/// independently and partial files must still merge.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeedFile {
    pub source: String,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_packages: Option<u64>,
    #[serde(default)]
    pub ecosystems: Vec<String>,
    #[serde(default)]
    pub packages: Vec<RawPackageRecord>,
}

/// A single package record as reported by one feed. Ecosystem and severity
/// labels are source-specific vocabularies; normalization happens in the
/// builder, not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPackageRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ecosystem: Option<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub detected_behaviors: Vec<String>,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RawPackageRecord {
    /// A record missing its identity (name or ecosystem) cannot be merged
    /// and is skipped with a warning.
    pub fn is_malformed(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            || self.ecosystem.as_deref().map_or(true, str::is_empty)
    }

    /// Parses `first_seen` as a date value. Feeds report either a bare date
    /// or a full timestamp; both forms compare correctly once parsed.
    pub fn first_seen_date(&self) -> Option<NaiveDate> {
        let raw = self.first_seen.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date);
        }
        raw.parse::<DateTime<Utc>>().ok().map(|ts| ts.date_naive())
    }
}
