use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::ports::outbound::IndexStore;
use crate::scan::domain::{Ecosystem, UnifiedIndex};
use crate::shared::error::ScanError;
use crate::shared::security;
use crate::shared::Result;

/// FileSystemIndexStore adapter persisting unified indexes as
/// `final-data/unified_{ecosystem}.json` files.
pub struct FileSystemIndexStore {
    dir: PathBuf,
}

impl FileSystemIndexStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn index_path(&self, ecosystem: &Ecosystem) -> PathBuf {
        self.dir.join(format!("unified_{}.json", ecosystem.as_str()))
    }
}

impl IndexStore for FileSystemIndexStore {
    fn load(&self, ecosystem: &Ecosystem) -> Result<Option<UnifiedIndex>> {
        let path = self.index_path(ecosystem);
        if !path.exists() {
            return Ok(None);
        }

        let content = security::read_checked(&path, "unified index")?;
        let index: UnifiedIndex =
            serde_json::from_str(&content).map_err(|e| ScanError::FileParseError {
                path: path.clone(),
                details: e.to_string(),
            })?;
        Ok(Some(index))
    }

    /// Writes the index with a whole-file replace: serialize to a tempfile
    /// in the target directory, then atomically swap it into place, so a
    /// concurrent reader never observes a partially written index.
    fn store(&self, index: &UnifiedIndex) -> Result<()> {
        let path = self.index_path(&index.ecosystem);
        fs::create_dir_all(&self.dir).map_err(|e| ScanError::FileWriteError {
            path: self.dir.clone(),
            details: e.to_string(),
        })?;

        let content = serde_json::to_string_pretty(index)?;

        let mut tmp =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| ScanError::FileWriteError {
                path: path.clone(),
                details: e.to_string(),
            })?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| ScanError::FileWriteError {
                path: path.clone(),
                details: e.to_string(),
            })?;
        tmp.persist(&path).map_err(|e| ScanError::FileWriteError {
            path: path.clone(),
            details: e.to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemIndexStore::new(dir.path().join("final-data"));

        let index = UnifiedIndex::empty(Ecosystem::Npm);
        store.store(&index).unwrap();

        let loaded = store.load(&Ecosystem::Npm).unwrap().unwrap();
        assert_eq!(loaded, index);
        assert!(dir.path().join("final-data").join("unified_npm.json").exists());
    }

    #[test]
    fn test_load_missing_index_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemIndexStore::new(dir.path().to_path_buf());
        assert!(store.load(&Ecosystem::Cargo).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_index_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("unified_npm.json"), "{ nope").unwrap();

        let store = FileSystemIndexStore::new(dir.path().to_path_buf());
        let result = store.load(&Ecosystem::Npm);
        assert!(result.is_err());
    }

    #[test]
    fn test_store_replaces_existing_file_whole() {
        let dir = TempDir::new().unwrap();
        let store = FileSystemIndexStore::new(dir.path().to_path_buf());

        store.store(&UnifiedIndex::empty(Ecosystem::Npm)).unwrap();
        store.store(&UnifiedIndex::empty(Ecosystem::Npm)).unwrap();

        // still exactly one readable index
        let loaded = store.load(&Ecosystem::Npm).unwrap();
        assert!(loaded.is_some());
    }
}
