use crate::scan::domain::{InstalledDependency, MatchKind, PackageMatch};
use crate::scan::services::database::PackageDatabase;

/// Strips semver range prefixes (`^ ~ >= <= > <`) from a declared version
/// so it can be compared against the known-bad set as an exact string.
pub fn strip_range_prefix(version: &str) -> &str {
    version
        .trim()
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '>' | '=' | '<'))
        .trim()
}

/// Classifies one installed dependency against the known-bad database.
///
/// Returns `None` when the package is untracked. Version comparison is
/// exact-string, never semver-range evaluation: a version absent from the
/// known-bad set is reported as `Potential`, not escalated to `Exact`,
/// even when it is semantically inside a compromised range. False negatives
/// on the exact-match claim are preferred over false positives.
pub fn classify(dep: &InstalledDependency, db: &PackageDatabase) -> Option<PackageMatch> {
    let record = db.lookup(&dep.ecosystem, &dep.name)?;

    let clean = strip_range_prefix(&dep.version);
    let kind = if !clean.is_empty() && record.versions.contains(clean) {
        MatchKind::Exact
    } else {
        MatchKind::Potential
    };

    Some(PackageMatch {
        dependency: dep.clone(),
        record: record.clone(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::domain::Ecosystem;

    fn db() -> PackageDatabase {
        PackageDatabase::builtin_fallback()
    }

    fn dep(name: &str, version: &str) -> InstalledDependency {
        InstalledDependency::new(Ecosystem::Npm, name, version, "dependencies")
    }

    #[test]
    fn test_strip_range_prefix() {
        assert_eq!(strip_range_prefix("^7.2.2"), "7.2.2");
        assert_eq!(strip_range_prefix("~1.0.0"), "1.0.0");
        assert_eq!(strip_range_prefix(">=2.0.0"), "2.0.0");
        assert_eq!(strip_range_prefix("<=3.1.4"), "3.1.4");
        assert_eq!(strip_range_prefix(" 7.2.2 "), "7.2.2");
        assert_eq!(strip_range_prefix("7.2.2"), "7.2.2");
    }

    #[test]
    fn test_version_in_known_bad_set_is_exact() {
        // Scenario A: declared 7.2.2, known-bad {7.2.2, 7.2.1}
        let m = classify(&dep("@ctrl/deluge", "7.2.2"), &db()).unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
        assert_eq!(m.dependency.location, "dependencies");
    }

    #[test]
    fn test_range_prefixed_exact_version_is_exact() {
        let m = classify(&dep("@ctrl/deluge", "^7.2.2"), &db()).unwrap();
        assert_eq!(m.kind, MatchKind::Exact);
    }

    #[test]
    fn test_tracked_name_with_unknown_version_is_potential() {
        // Scenario B: declared 7.2.0 against the same entry
        let m = classify(&dep("@ctrl/deluge", "7.2.0"), &db()).unwrap();
        assert_eq!(m.kind, MatchKind::Potential);
    }

    #[test]
    fn test_untracked_package_yields_nothing() {
        assert!(classify(&dep("left-pad", "1.3.0"), &db()).is_none());
    }

    #[test]
    fn test_newer_version_never_escalates_to_exact() {
        // Conservative policy: semantically newer but not in the set.
        let m = classify(&dep("@ctrl/deluge", "7.2.3"), &db()).unwrap();
        assert_eq!(m.kind, MatchKind::Potential);
    }

    #[test]
    fn test_missing_version_is_potential() {
        let m = classify(&dep("@ctrl/deluge", ""), &db()).unwrap();
        assert_eq!(m.kind, MatchKind::Potential);
    }

    #[test]
    fn test_classification_is_deterministic() {
        for _ in 0..3 {
            let m = classify(&dep("@ctrl/deluge", "7.2.1"), &db()).unwrap();
            assert_eq!(m.kind, MatchKind::Exact);
        }
    }
}
