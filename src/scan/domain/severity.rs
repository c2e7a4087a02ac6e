use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a compromised package or IoC finding.
///
/// The ordering is total and ordinal (critical > high > medium > low), which
/// is what makes severity merging a simple `max`. Feeds use wildly different
/// vocabularies and numeric scales; [`Severity::parse`] folds them all onto
/// this fixed set, with unrecognized labels landing on `Medium`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parses a source-specific severity label or numeric risk score.
    ///
    /// Recognized labels cover the vocabularies of the supported feeds
    /// ("severe", "important", "moderate", ...). Numeric inputs are treated
    /// as 0-100 risk scores. Anything else normalizes to `Medium` so that
    /// a single feed with an odd vocabulary can neither hide a package nor
    /// inflate it to critical.
    pub fn parse(label: &str) -> Severity {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "critical" | "crit" | "severe" => return Severity::Critical,
            "high" | "important" => return Severity::High,
            "medium" | "moderate" | "med" => return Severity::Medium,
            "low" | "minor" => return Severity::Low,
            _ => {}
        }

        if let Ok(score) = normalized.parse::<f64>() {
            return Severity::from_score(score);
        }

        Severity::Medium
    }

    /// Maps a 0-100 risk score to a severity level.
    pub fn from_score(score: f64) -> Severity {
        if score >= 90.0 {
            Severity::Critical
        } else if score >= 70.0 {
            Severity::High
        } else if score >= 40.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
