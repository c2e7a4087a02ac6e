use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::scan::domain::Ecosystem;

/// Directories never descended into: dependency caches, build artifacts,
/// editor state. Shared by ecosystem detection and the IoC walk.
pub const SKIP_DIRS: [&str; 23] = [
    "node_modules",
    ".git",
    "__pycache__",
    "venv",
    "env",
    ".venv",
    ".next",
    "build",
    "dist",
    ".build",
    "target",
    "out",
    ".cache",
    ".idea",
    ".vscode",
    ".vs",
    "coverage",
    ".nyc_output",
    ".pytest_cache",
    ".gradle",
    ".mvn",
    "vendor",
    "bower_components",
];

/// Manifest/lockfile basenames that identify an ecosystem's presence.
const FILENAME_TO_ECOSYSTEM: [(&str, Ecosystem); 17] = [
    ("package.json", Ecosystem::Npm),
    ("package-lock.json", Ecosystem::Npm),
    ("yarn.lock", Ecosystem::Npm),
    ("pnpm-lock.yaml", Ecosystem::Npm),
    ("requirements.txt", Ecosystem::PyPi),
    ("setup.py", Ecosystem::PyPi),
    ("pyproject.toml", Ecosystem::PyPi),
    ("Pipfile", Ecosystem::PyPi),
    ("poetry.lock", Ecosystem::PyPi),
    ("pom.xml", Ecosystem::Maven),
    ("build.gradle", Ecosystem::Maven),
    ("Gemfile", Ecosystem::RubyGems),
    ("Gemfile.lock", Ecosystem::RubyGems),
    ("go.mod", Ecosystem::Go),
    ("go.sum", Ecosystem::Go),
    ("Cargo.toml", Ecosystem::Cargo),
    ("Cargo.lock", Ecosystem::Cargo),
];

/// Reporting order when several ecosystems are present in one tree.
const PRIORITY: [Ecosystem; 6] = [
    Ecosystem::Npm,
    Ecosystem::PyPi,
    Ecosystem::Maven,
    Ecosystem::RubyGems,
    Ecosystem::Go,
    Ecosystem::Cargo,
];

pub fn should_skip_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name)
}

/// Detects the ecosystem a single file belongs to from its basename.
pub fn detect_from_filename(path: &Path) -> Option<Ecosystem> {
    let basename = path.file_name()?.to_str()?;
    FILENAME_TO_ECOSYSTEM
        .iter()
        .find(|(name, _)| *name == basename)
        .map(|(_, eco)| eco.clone())
}

/// Detects every ecosystem with a characteristic manifest somewhere under
/// `directory`, in priority order. Dependency-cache directories are not
/// descended into.
pub fn detect_all(directory: &Path) -> Vec<Ecosystem> {
    let mut found = Vec::new();
    for entry in walk(directory) {
        if entry.file_type().is_file() {
            if let Some(eco) = detect_from_filename(entry.path()) {
                if !found.contains(&eco) {
                    found.push(eco);
                }
            }
        }
    }

    let mut ordered: Vec<Ecosystem> = PRIORITY
        .iter()
        .filter(|eco| found.contains(eco))
        .cloned()
        .collect();
    for eco in found {
        if !ordered.contains(&eco) {
            ordered.push(eco);
        }
    }
    ordered
}

/// Files under `directory` the dependency extractor knows how to parse for
/// the given ecosystem.
pub fn find_dependency_files(directory: &Path, ecosystem: &Ecosystem) -> Vec<PathBuf> {
    let targets: &[&str] = match ecosystem {
        Ecosystem::Npm => &["package.json", "package-lock.json"],
        Ecosystem::PyPi => &["requirements.txt"],
        Ecosystem::Maven => &["pom.xml"],
        Ecosystem::RubyGems => &["Gemfile"],
        Ecosystem::Go => &["go.mod"],
        Ecosystem::Cargo => &["Cargo.toml"],
        _ => &[],
    };

    let mut files = Vec::new();
    for entry in walk(directory) {
        if entry.file_type().is_file() {
            if let Some(basename) = entry.file_name().to_str() {
                if targets.contains(&basename) {
                    files.push(entry.into_path());
                }
            }
        }
    }
    files
}

fn walk(directory: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // Only prune below the root: the scanned directory itself may
            // carry any name.
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && e.file_name()
                        .to_str()
                        .map(should_skip_dir)
                        .unwrap_or(false))
        })
        .filter_map(Result::ok)
}
