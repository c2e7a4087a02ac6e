use std::path::PathBuf;

use crate::ports::outbound::{FeedLoadResult, FeedSource};
use crate::scan::domain::RawFeedFile;
use crate::shared::security;
use crate::shared::Result;

/// FileSystemFeedSource adapter reading collector output from a
/// `raw-data/` directory.
///
/// Every `*.json` file in the directory is treated as one source's output.
/// A file that cannot be read or parsed marks its source as failed and the
/// load continues - collectors fail independently.
pub struct FileSystemFeedSource {
    raw_dir: PathBuf,
}

impl FileSystemFeedSource {
    pub fn new(raw_dir: PathBuf) -> Self {
        Self { raw_dir }
    }
}

impl FeedSource for FileSystemFeedSource {
    fn load_feeds(&self) -> Result<FeedLoadResult> {
        let mut result = FeedLoadResult::default();

        if !self.raw_dir.is_dir() {
            return Ok(result);
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.raw_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let source_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();

            let parsed = security::read_checked(&path, "raw feed file")
                .and_then(|content| Ok(serde_json::from_str::<RawFeedFile>(&content)?));

            match parsed {
                Ok(feed) => result.feeds.push(feed),
                Err(e) => {
                    eprintln!("⚠️  Warning: could not load feed {}: {}", path.display(), e);
                    result.failed_sources.push(source_name);
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_feeds_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("osv.json"),
            r#"{"source": "osv", "packages": []}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("socketdev.json"),
            r#"{"source": "socketdev", "packages": []}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = FileSystemFeedSource::new(dir.path().to_path_buf());
        let result = source.load_feeds().unwrap();

        assert_eq!(result.feeds.len(), 2);
        assert_eq!(result.feeds[0].source, "osv");
        assert!(result.failed_sources.is_empty());
    }

    #[test]
    fn test_corrupt_feed_fails_independently() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("phylum.json"), "{ broken").unwrap();
        fs::write(
            dir.path().join("osv.json"),
            r#"{"source": "osv", "packages": []}"#,
        )
        .unwrap();

        let source = FileSystemFeedSource::new(dir.path().to_path_buf());
        let result = source.load_feeds().unwrap();

        assert_eq!(result.feeds.len(), 1);
        assert_eq!(result.failed_sources, vec!["phylum"]);
    }

    #[test]
    fn test_missing_directory_yields_empty_result() {
        let source = FileSystemFeedSource::new(PathBuf::from("/nonexistent/raw-data"));
        let result = source.load_feeds().unwrap();
        assert!(result.feeds.is_empty());
        assert!(result.failed_sources.is_empty());
    }
}
