use serde::Serialize;

use crate::scan::domain::severity::Severity;

/// Which class of file a content pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// `package.json` manifests.
    PackageManifest,
    /// Script-like files: `.js`, `.ts`, `.json`, `.sh`, `.bash`
    /// (excluding `package.json`, which has its own checks).
    Script,
    /// CI workflow files: `.yml`/`.yaml` under a `.github` or `workflows`
    /// path segment.
    Workflow,
}

/// How a catalog entry matches.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// File basename equals a known payload/data filename.
    FilenameEquals { filename: &'static str },
    /// Basename equality gated by a SHA-256 digest check against known
    /// malicious hashes. The hash is only computed for files passing the
    /// basename and size pre-filter.
    FilenameHash {
        filename: &'static str,
        digests: &'static [&'static str],
    },
    /// Workflow file whose basename matches a regex.
    WorkflowFilename { pattern: regex::Regex },
    /// File content matches a fixed regex.
    ContentRegex {
        pattern: regex::Regex,
        applies_to: FileClass,
    },
    /// A structured field in a workflow/config file equals a known hostile
    /// value, checked on the parsed document rather than raw text.
    StructuredField {
        key: &'static str,
        value: &'static str,
        /// Extra basename constraint, e.g. only `discussion.yaml`.
        filename: Option<&'static str>,
    },
}

/// One entry of the fixed IoC pattern catalog. Static for the duration of
/// a scan.
#[derive(Debug, Clone)]
pub struct IocPattern {
    /// Finding type tag, e.g. `malicious_payload_file`.
    pub finding_type: &'static str,
    /// Campaign-generation discriminator. Detection for one generation
    /// never masks another, so the variant rides along on every finding.
    pub variant: Option<&'static str>,
    pub severity: Severity,
    pub matcher: Matcher,
    /// Human-readable pattern note carried into findings where the matched
    /// fragment itself is not useful (hook names, workflow shapes).
    pub note: Option<&'static str>,
}

/// A single IoC hit, collected into the scan report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IocFinding {
    #[serde(rename = "type")]
    pub finding_type: String,
    pub path: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl IocFinding {
    pub fn new(pattern: &IocPattern, path: impl Into<String>) -> IocFinding {
        IocFinding {
            finding_type: pattern.finding_type.to_string(),
            path: path.into(),
            severity: pattern.severity,
            variant: pattern.variant.map(str::to_string),
            hash: None,
            pattern: pattern.note.map(str::to_string),
            filename: None,
            url: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> IocFinding {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> IocFinding {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> IocFinding {
        self.url = Some(url.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> IocFinding {
        self.pattern = Some(pattern.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_serialization_skips_absent_detail() {
        let pattern = IocPattern {
            finding_type: "malicious_payload_file",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::FilenameEquals {
                filename: "setup_bun.js",
            },
            note: None,
        };

        let finding = IocFinding::new(&pattern, "lib/setup_bun.js").with_filename("setup_bun.js");
        let json = serde_json::to_string(&finding).unwrap();

        assert!(json.contains("\"type\":\"malicious_payload_file\""));
        assert!(json.contains("\"variant\":\"2.0\""));
        assert!(json.contains("\"filename\":\"setup_bun.js\""));
        assert!(!json.contains("\"hash\""));
        assert!(!json.contains("\"url\""));
    }
}
