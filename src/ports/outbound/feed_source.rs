use crate::scan::domain::RawFeedFile;
use crate::shared::Result;

/// Result of gathering raw feeds: whatever loaded, plus the sources that
/// failed. Collectors fail independently; the index builder works with any
/// subset.
#[derive(Debug, Default)]
pub struct FeedLoadResult {
    pub feeds: Vec<RawFeedFile>,
    pub failed_sources: Vec<String>,
}

/// Outbound port: "give me the list of raw per-source package records".
///
/// The filesystem adapter reads `raw-data/{source}.json` files; tests
/// substitute in-memory fixtures.
pub trait FeedSource {
    fn load_feeds(&self) -> Result<FeedLoadResult>;
}
