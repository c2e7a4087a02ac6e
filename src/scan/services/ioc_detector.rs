use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::scan::domain::{FileClass, IocFinding, IocPattern, Matcher, Severity};
use crate::scan::services::ecosystem_detector::should_skip_dir;
use crate::shared::security::MAX_FILE_SIZE;

/// Exfiltration endpoint used by the original campaign wave.
const EXFIL_WEBHOOK_URL: &str = "https://webhook.site/bb8ca5f6-4175-45d2-b042-fc9ebb8170b7";

/// SHA-256 digests of the known malicious `bundle.js` payload bundles.
const BUNDLE_JS_DIGESTS: [&str; 3] = [
    "46faab8ab153fae6e80e7cca38eab363075bb524edd79e42269217a083628f09",
    "81d2a004a1bca6ef87a1caf7d0e0b355ad1764238e40ff6d1b1cb77ad4f595c3",
    "dc67467a39b70d1cd4c1f7f7a459b35058163592f4a9e8fb4dffcbba98ef210c",
];

/// Secondary payload files dropped by the second campaign wave.
const PAYLOAD_FILES: [&str; 2] = ["setup_bun.js", "bun_environment.js"];

/// Harvested-secrets dumps left behind by the second wave.
const DATA_FILES: [&str; 5] = [
    "cloud.json",
    "contents.json",
    "environment.json",
    "truffleSecrets.json",
    "actionsSecrets.json",
];

/// Result of one IoC walk: the findings plus the count of files and
/// subtrees that could not be inspected.
#[derive(Debug, Default)]
pub struct IocScanOutcome {
    pub findings: Vec<IocFinding>,
    pub walk_errors: usize,
}

/// The fixed pattern catalog, covering both campaign generations. Variants
/// are independent: detection for one generation never masks another.
pub fn catalog() -> Vec<IocPattern> {
    let regex = |pattern: &str| Regex::new(pattern).expect("catalog regex is valid");

    vec![
        IocPattern {
            finding_type: "malicious_bundle_js",
            variant: Some("original"),
            severity: Severity::Critical,
            matcher: Matcher::FilenameHash {
                filename: "bundle.js",
                digests: &BUNDLE_JS_DIGESTS,
            },
            note: None,
        },
        IocPattern {
            finding_type: "malicious_payload_file",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::FilenameEquals {
                filename: PAYLOAD_FILES[0],
            },
            note: None,
        },
        IocPattern {
            finding_type: "malicious_payload_file",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::FilenameEquals {
                filename: PAYLOAD_FILES[1],
            },
            note: None,
        },
        IocPattern {
            finding_type: "shai_hulud_data_file",
            variant: Some("2.0"),
            severity: Severity::High,
            matcher: Matcher::FilenameEquals {
                filename: DATA_FILES[0],
            },
            note: None,
        },
        IocPattern {
            finding_type: "shai_hulud_data_file",
            variant: Some("2.0"),
            severity: Severity::High,
            matcher: Matcher::FilenameEquals {
                filename: DATA_FILES[1],
            },
            note: None,
        },
        IocPattern {
            finding_type: "shai_hulud_data_file",
            variant: Some("2.0"),
            severity: Severity::High,
            matcher: Matcher::FilenameEquals {
                filename: DATA_FILES[2],
            },
            note: None,
        },
        IocPattern {
            finding_type: "shai_hulud_data_file",
            variant: Some("2.0"),
            severity: Severity::High,
            matcher: Matcher::FilenameEquals {
                filename: DATA_FILES[3],
            },
            note: None,
        },
        IocPattern {
            finding_type: "shai_hulud_data_file",
            variant: Some("2.0"),
            severity: Severity::High,
            matcher: Matcher::FilenameEquals {
                filename: DATA_FILES[4],
            },
            note: None,
        },
        IocPattern {
            finding_type: "malicious_postinstall",
            variant: Some("original"),
            severity: Severity::Critical,
            matcher: Matcher::ContentRegex {
                pattern: regex(r#""postinstall":\s*"node\s+bundle\.js""#),
                applies_to: FileClass::PackageManifest,
            },
            note: Some("node bundle.js"),
        },
        IocPattern {
            finding_type: "malicious_preinstall",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::ContentRegex {
                pattern: regex(r#""preinstall":\s*"node\s+(bundle|setup_bun|bun_environment)\.js""#),
                applies_to: FileClass::PackageManifest,
            },
            note: Some("preinstall hook with suspicious payload"),
        },
        IocPattern {
            finding_type: "webhook_site_reference",
            variant: None,
            severity: Severity::High,
            matcher: Matcher::ContentRegex {
                pattern: regex(&regex::escape(EXFIL_WEBHOOK_URL)),
                applies_to: FileClass::PackageManifest,
            },
            note: None,
        },
        IocPattern {
            finding_type: "webhook_site_reference",
            variant: None,
            severity: Severity::High,
            matcher: Matcher::ContentRegex {
                pattern: regex(&regex::escape(EXFIL_WEBHOOK_URL)),
                applies_to: FileClass::Script,
            },
            note: None,
        },
        IocPattern {
            finding_type: "docker_privilege_escalation",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::ContentRegex {
                pattern: regex(r"docker\s+run\s+--rm\s+--privileged\s+-v\s+/:/host"),
                applies_to: FileClass::Script,
            },
            note: Some("Docker privileged container with host mount"),
        },
        IocPattern {
            finding_type: "sha1hulud_runner",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::ContentRegex {
                pattern: regex(r"(?i)SHA1HULUD"),
                applies_to: FileClass::Workflow,
            },
            note: Some("SHA1HULUD runner registration"),
        },
        IocPattern {
            finding_type: "malicious_github_workflow",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::WorkflowFilename {
                pattern: regex(r"^formatter_\d+\.yml$"),
            },
            note: Some("formatter workflow for secret exfiltration"),
        },
        IocPattern {
            finding_type: "malicious_github_workflow",
            variant: Some("original"),
            severity: Severity::Critical,
            matcher: Matcher::WorkflowFilename {
                pattern: regex(r"^shai-hulud-workflow\.yml$"),
            },
            note: Some("shai-hulud-workflow.yml"),
        },
        IocPattern {
            finding_type: "malicious_github_workflow",
            variant: Some("2.0"),
            severity: Severity::Critical,
            matcher: Matcher::StructuredField {
                key: "runs-on",
                value: "self-hosted",
                filename: Some("discussion.yaml"),
            },
            note: Some("discussion.yaml with self-hosted runner"),
        },
        IocPattern {
            finding_type: "suspicious_runner_config",
            variant: Some("2.0"),
            severity: Severity::High,
            matcher: Matcher::StructuredField {
                key: "RUNNER_TRACKING_ID",
                value: "0",
                filename: None,
            },
            note: Some("RUNNER_TRACKING_ID: 0"),
        },
    ]
}

/// Walks a file tree and matches every file against the pattern catalog.
pub struct IocDetector {
    patterns: Vec<IocPattern>,
}

impl Default for IocDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IocDetector {
    pub fn new() -> IocDetector {
        IocDetector {
            patterns: catalog(),
        }
    }

    /// For tests and custom deployments: run with a caller-supplied catalog.
    pub fn with_patterns(patterns: Vec<IocPattern>) -> IocDetector {
        IocDetector { patterns }
    }

    /// Walks `root`, skipping dependency-cache directories, and evaluates
    /// the full catalog against every file. A single file may produce
    /// several findings of different types. Unreadable files and subtrees
    /// are counted, never fatal.
    pub fn scan(&self, root: &Path) -> IocScanOutcome {
        let mut outcome = IocScanOutcome::default();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Only prune below the root: the scanned directory itself
                // may carry any name.
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && e.file_name()
                            .to_str()
                            .map(should_skip_dir)
                            .unwrap_or(false))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => {
                    outcome.walk_errors += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            self.scan_file(entry.path(), root, &mut outcome);
        }

        outcome
    }

    fn scan_file(&self, path: &Path, root: &Path, outcome: &mut IocScanOutcome) {
        let basename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let class = classify_file(path, basename);
        let display = relative_display(path, root);

        // Content is read at most once per file, and only for classes that
        // have content or structured-field patterns at all.
        let text: Option<String> = if class.is_some() {
            load_content(path, outcome)
        } else {
            None
        };
        let workflow_doc: Option<serde_yaml_ng::Value> = if class == Some(FileClass::Workflow) {
            text.as_deref()
                .and_then(|t| serde_yaml_ng::from_str(t).ok())
        } else {
            None
        };

        for pattern in &self.patterns {
            match &pattern.matcher {
                Matcher::FilenameEquals { filename } => {
                    if basename == *filename {
                        outcome
                            .findings
                            .push(IocFinding::new(pattern, &display).with_filename(basename));
                    }
                }
                Matcher::FilenameHash { filename, digests } => {
                    if basename != *filename {
                        continue;
                    }
                    match hash_if_small_enough(path) {
                        Ok(Some(digest)) => {
                            if digests.contains(&digest.as_str()) {
                                outcome
                                    .findings
                                    .push(IocFinding::new(pattern, &display).with_hash(digest));
                            }
                        }
                        Ok(None) => {}
                        Err(_) => outcome.walk_errors += 1,
                    }
                }
                Matcher::WorkflowFilename { pattern: name_re } => {
                    if class == Some(FileClass::Workflow) && name_re.is_match(basename) {
                        outcome.findings.push(IocFinding::new(pattern, &display));
                    }
                }
                Matcher::ContentRegex {
                    pattern: content_re,
                    applies_to,
                } => {
                    if class != Some(*applies_to) {
                        continue;
                    }
                    let Some(text) = text.as_deref() else {
                        continue;
                    };
                    if let Some(m) = content_re.find(text) {
                        let mut finding = IocFinding::new(pattern, &display);
                        if pattern.finding_type == "webhook_site_reference" {
                            finding = finding.with_url(m.as_str());
                        } else if finding.pattern.is_none() {
                            finding = finding.with_pattern(m.as_str());
                        }
                        outcome.findings.push(finding);
                    }
                }
                Matcher::StructuredField {
                    key,
                    value,
                    filename,
                } => {
                    if let Some(required) = filename {
                        if basename != *required {
                            continue;
                        }
                    }
                    let Some(doc) = workflow_doc.as_ref() else {
                        continue;
                    };
                    if yaml_contains_field(doc, key, value) {
                        outcome.findings.push(IocFinding::new(pattern, &display));
                    }
                }
            }
        }
    }
}

fn classify_file(path: &Path, basename: &str) -> Option<FileClass> {
    if basename == "package.json" {
        return Some(FileClass::PackageManifest);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if matches!(extension, "yml" | "yaml") && in_workflow_path(path) {
        return Some(FileClass::Workflow);
    }
    if matches!(extension, "js" | "ts" | "json" | "sh" | "bash") {
        return Some(FileClass::Script);
    }
    None
}

fn in_workflow_path(path: &Path) -> bool {
    path.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some(".github") | Some("workflows")
        )
    })
}

fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Computes the SHA-256 digest of a file passing the size pre-filter;
/// oversized files are skipped rather than hashed.
fn hash_if_small_enough(path: &Path) -> io::Result<Option<String>> {
    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_FILE_SIZE {
        return Ok(None);
    }
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(Some(hex::encode(hasher.finalize())))
}

fn load_content(path: &Path, outcome: &mut IocScanOutcome) -> Option<String> {
    match fs::metadata(path) {
        Ok(m) if m.len() <= MAX_FILE_SIZE => match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(_) => {
                // Binary or unreadable; skip content checks for this file.
                outcome.walk_errors += 1;
                None
            }
        },
        Ok(_) => None,
        Err(_) => {
            outcome.walk_errors += 1;
            None
        }
    }
}

/// Searches a parsed YAML document for `key: value` at any nesting depth.
/// Scalar comparison is loose enough to match numbers and booleans against
/// their string spellings (`RUNNER_TRACKING_ID: 0`), and a sequence value
/// matches when any element does (`runs-on: [self-hosted, linux]`).
fn yaml_contains_field(doc: &serde_yaml_ng::Value, key: &str, expected: &str) -> bool {
    use serde_yaml_ng::Value;

    match doc {
        Value::Mapping(map) => map.iter().any(|(k, v)| {
            (k.as_str() == Some(key) && yaml_value_equals(v, expected))
                || yaml_contains_field(v, key, expected)
        }),
        Value::Sequence(seq) => seq.iter().any(|v| yaml_contains_field(v, key, expected)),
        _ => false,
    }
}

fn yaml_value_equals(value: &serde_yaml_ng::Value, expected: &str) -> bool {
    use serde_yaml_ng::Value;

    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        Value::Sequence(seq) => seq.iter().any(|v| yaml_value_equals(v, expected)),
        _ => false,
    }
}
