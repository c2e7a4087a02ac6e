use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::dto::{ScanRequest, ScanResponse, ScanTarget};
use crate::ports::outbound::IndexStore;
use crate::scan::domain::{
    Ecosystem, InstalledDependency, PackageMatch, ScanReport, ScanWarnings,
};
use crate::scan::services::{
    database::PackageDatabase, dependency_extractor, ecosystem_detector, version_matcher,
    IocDetector,
};
use crate::shared::error::ScanError;
use crate::shared::{security, Result};

/// RunScanUseCase - one full scan invocation.
///
/// Drives the phases in order: load database, detect ecosystems, extract
/// dependencies, match, detect IoCs, assemble the report. IoC detection is
/// independent of ecosystem detection and runs unless the request disables
/// it. A database that cannot be loaded falls back to the bundled record
/// set instead of blocking the scan.
///
/// # Type Parameters
/// * `S` - IndexStore implementation the database is loaded through
pub struct RunScanUseCase<S: IndexStore> {
    index_store: S,
    /// Optional path to the bundled `affected_packages.yaml` dataset, tried
    /// before the built-in record set when no unified index is available.
    fallback_dataset: Option<PathBuf>,
}

impl<S: IndexStore> RunScanUseCase<S> {
    pub fn new(index_store: S, fallback_dataset: Option<PathBuf>) -> Self {
        Self {
            index_store,
            fallback_dataset,
        }
    }

    pub fn execute(&self, request: ScanRequest) -> Result<ScanResponse> {
        let mut warnings = ScanWarnings::default();

        let database = if request.check_packages {
            let (database, used_fallback) = self.load_database();
            warnings.database_fallback = used_fallback;
            Some(database)
        } else {
            None
        };

        let ecosystems = self.detect_ecosystems(&request)?;

        let mut matches: Vec<PackageMatch> = Vec::new();
        let mut total_scanned = 0usize;
        if let Some(database) = &database {
            let dependencies = self.extract_dependencies(&request, &ecosystems, &mut warnings);
            let unique = dedup_dependencies(dependencies);
            total_scanned = unique.len();

            for dependency in &unique {
                if let Some(package_match) = version_matcher::classify(dependency, database) {
                    matches.push(package_match);
                }
            }
        }

        let iocs = if request.scan_iocs {
            let spinner = scan_spinner();
            let outcome = IocDetector::new().scan(&request.target.ioc_root());
            spinner.finish_and_clear();
            warnings.walk_errors += outcome.walk_errors;
            outcome.findings
        } else {
            Vec::new()
        };

        let ecosystem_label = if ecosystems.is_empty() {
            "unknown".to_string()
        } else {
            ecosystems
                .iter()
                .map(Ecosystem::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let report = ScanReport::new(
            Utc::now(),
            ecosystem_label,
            request.target.path().display().to_string(),
            total_scanned,
            &matches,
            iocs,
            warnings,
        );

        Ok(ScanResponse { report, ecosystems })
    }

    /// Database fallback chain: unified indexes, then the bundled dataset,
    /// then the built-in minimal record set. Never fails.
    fn load_database(&self) -> (PackageDatabase, bool) {
        let mut indexes = Vec::new();
        for ecosystem in Ecosystem::KNOWN {
            match self.index_store.load(&ecosystem) {
                Ok(Some(index)) => indexes.push(index),
                Ok(None) => {}
                Err(e) => eprintln!(
                    "⚠️  Warning: failed to load unified index for {}: {}",
                    ecosystem, e
                ),
            }
        }
        if !indexes.is_empty() {
            return (PackageDatabase::from_indexes(indexes), false);
        }

        if let Some(path) = &self.fallback_dataset {
            let loaded = security::read_checked(path, "fallback dataset")
                .and_then(|content| PackageDatabase::from_affected_packages_yaml(&content));
            match loaded {
                Ok(database) if !database.is_empty() => return (database, true),
                Ok(_) => {}
                Err(e) => eprintln!(
                    "⚠️  Warning: could not load fallback dataset {}: {}",
                    path.display(),
                    e
                ),
            }
        }

        (PackageDatabase::builtin_fallback(), true)
    }

    fn detect_ecosystems(&self, request: &ScanRequest) -> Result<Vec<Ecosystem>> {
        if let Some(ecosystem) = &request.ecosystem_override {
            return Ok(vec![ecosystem.clone()]);
        }

        match &request.target {
            ScanTarget::Directory(path) => Ok(ecosystem_detector::detect_all(path)),
            ScanTarget::File(path) => {
                match ecosystem_detector::detect_from_filename(path) {
                    Some(ecosystem) => Ok(vec![ecosystem]),
                    // Generic package lists need an explicit ecosystem to
                    // check against; an IoC-only run does not.
                    None if request.check_packages => Err(ScanError::Validation {
                        message: format!(
                            "Could not determine the ecosystem for {}. Specify one with --ecosystem.",
                            path.display()
                        ),
                    }
                    .into()),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    fn extract_dependencies(
        &self,
        request: &ScanRequest,
        ecosystems: &[Ecosystem],
        warnings: &mut ScanWarnings,
    ) -> Vec<InstalledDependency> {
        let mut dependencies = Vec::new();

        match &request.target {
            ScanTarget::Directory(path) => {
                for ecosystem in ecosystems {
                    for file in ecosystem_detector::find_dependency_files(path, ecosystem) {
                        match dependency_extractor::extract_from_file(&file, ecosystem) {
                            Ok(found) => dependencies.extend(found),
                            Err(e) => {
                                eprintln!("⚠️  Warning: {}: {}", file.display(), e);
                                warnings.input_errors += 1;
                            }
                        }
                    }
                }
            }
            ScanTarget::File(path) => {
                for ecosystem in ecosystems {
                    let extracted =
                        if ecosystem_detector::detect_from_filename(path).is_some() {
                            dependency_extractor::extract_from_file(path, ecosystem)
                        } else {
                            dependency_extractor::extract_from_list_file(path, ecosystem)
                        };
                    match extracted {
                        Ok(found) => dependencies.extend(found),
                        Err(e) => {
                            eprintln!("⚠️  Warning: {}: {}", path.display(), e);
                            warnings.input_errors += 1;
                        }
                    }
                }
            }
        }

        dependencies
    }
}

/// Duplicate declarations at different depths all reach this point; the
/// report counts each (ecosystem, name, version) once, first location wins.
fn dedup_dependencies(dependencies: Vec<InstalledDependency>) -> Vec<InstalledDependency> {
    let mut seen = HashSet::new();
    dependencies
        .into_iter()
        .filter(|dep| {
            seen.insert((
                dep.ecosystem.clone(),
                dep.name.to_lowercase(),
                dep.version.clone(),
            ))
        })
        .collect()
}

fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("   {spinner:.green} {msg}")
            .expect("Failed to set progress bar template"),
    );
    spinner.set_message("Scanning for indicators of compromise...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::domain::{MatchKind, RawPackageRecord, UnifiedIndex};
    use crate::scan::domain::PackageRecord;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    /// In-memory IndexStore for exercising the use case without disk
    /// index files.
    struct MockIndexStore {
        indexes: BTreeMap<Ecosystem, UnifiedIndex>,
    }

    impl MockIndexStore {
        fn empty() -> Self {
            Self {
                indexes: BTreeMap::new(),
            }
        }

        fn with_npm_package(name: &str, versions: &[&str]) -> Self {
            let raw = RawPackageRecord {
                name: Some(name.to_string()),
                ecosystem: Some("npm".to_string()),
                versions: versions.iter().map(|v| v.to_string()).collect(),
                severity: Some("critical".to_string()),
                ..Default::default()
            };
            let record = PackageRecord::from_raw(&raw, "osv", None);
            let mut indexes = BTreeMap::new();
            indexes.insert(
                Ecosystem::Npm,
                UnifiedIndex::assemble(Ecosystem::Npm, vec![record]),
            );
            Self { indexes }
        }
    }

    impl IndexStore for MockIndexStore {
        fn load(&self, ecosystem: &Ecosystem) -> Result<Option<UnifiedIndex>> {
            Ok(self.indexes.get(ecosystem).cloned())
        }

        fn store(&self, _index: &UnifiedIndex) -> Result<()> {
            unreachable!("scans never write indexes")
        }
    }

    fn write_manifest(dir: &TempDir, content: &str) {
        fs::write(dir.path().join("package.json"), content).unwrap();
    }

    #[test]
    fn test_exact_match_from_unified_index() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"dependencies": {"@ctrl/deluge": "7.2.2"}}"#);

        let use_case = RunScanUseCase::new(
            MockIndexStore::with_npm_package("@ctrl/deluge", &["7.2.2", "7.2.1"]),
            None,
        );
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        let report = response.report;
        assert_eq!(report.ecosystem, "npm");
        assert_eq!(report.malicious_packages_found, 1);
        assert_eq!(report.malicious_packages[0].match_kind, MatchKind::Exact);
        assert_eq!(report.malicious_packages[0].location, "dependencies");
        assert!(!report.warnings.database_fallback);
    }

    #[test]
    fn test_missing_index_falls_back_to_builtin_set() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"dependencies": {"@ctrl/deluge": "^7.2.2"}}"#);

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert!(response.report.warnings.database_fallback);
        assert_eq!(response.report.malicious_packages_found, 1);
        assert_eq!(
            response.report.malicious_packages[0].match_kind,
            MatchKind::Exact
        );
    }

    #[test]
    fn test_fallback_dataset_preferred_over_builtin() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"dependencies": {"rare-pkg": "1.2.3"}}"#);

        let dataset = dir.path().join("affected_packages.yaml");
        fs::write(
            &dataset,
            "affected_packages:\n  - name: rare-pkg\n    versions: [\"1.2.3\"]\n",
        )
        .unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), Some(dataset));
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert!(response.report.warnings.database_fallback);
        assert_eq!(response.report.malicious_packages_found, 1);
    }

    #[test]
    fn test_ioc_only_skips_package_checks() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"dependencies": {"@ctrl/deluge": "7.2.2"}}"#);
        fs::write(dir.path().join("setup_bun.js"), "payload").unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .directory(dir.path())
            .ioc_only(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert_eq!(response.report.total_packages_scanned, 0);
        assert_eq!(response.report.malicious_packages_found, 0);
        assert_eq!(response.report.iocs_found, 1);
    }

    #[test]
    fn test_no_ioc_mode_skips_ioc_walk() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"name": "clean"}"#);
        fs::write(dir.path().join("setup_bun.js"), "payload").unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert_eq!(response.report.iocs_found, 0);
    }

    #[test]
    fn test_duplicate_dependencies_counted_once() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"dependencies": {"lodash": "4.17.21"}}"#);
        fs::write(
            dir.path().join("package-lock.json"),
            r#"{"packages": {"node_modules/lodash": {"version": "4.17.21"}}}"#,
        )
        .unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert_eq!(response.report.total_packages_scanned, 1);
    }

    #[test]
    fn test_unparseable_manifest_counts_input_error_and_continues() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, "{ definitely not json");

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert_eq!(response.report.warnings.input_errors, 1);
        assert_eq!(response.report.total_packages_scanned, 0);
    }

    #[test]
    fn test_file_target_with_list_requires_ecosystem() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("packages.txt");
        fs::write(&list, "lodash@4.17.21\n").unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .file(&list)
            .no_iocs(true)
            .build()
            .unwrap();

        assert!(use_case.execute(request).is_err());
    }

    #[test]
    fn test_file_target_with_ecosystem_override() {
        let dir = TempDir::new().unwrap();
        let list = dir.path().join("packages.txt");
        fs::write(&list, "@ctrl/deluge@7.2.2\n").unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .file(&list)
            .ecosystem_override(Some(Ecosystem::Npm))
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert_eq!(response.report.malicious_packages_found, 1);
    }

    #[test]
    fn test_multiple_ecosystems_merge_into_one_report() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, r#"{"dependencies": {"lodash": "4.17.21"}}"#);
        fs::write(dir.path().join("requirements.txt"), "requests==2.31.0\n").unwrap();

        let use_case = RunScanUseCase::new(MockIndexStore::empty(), None);
        let request = ScanRequest::builder()
            .directory(dir.path())
            .no_iocs(true)
            .build()
            .unwrap();

        let response = use_case.execute(request).unwrap();
        assert_eq!(response.report.ecosystem, "npm, pypi");
        assert_eq!(response.report.total_packages_scanned, 2);
    }
}
