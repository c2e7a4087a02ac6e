use crate::ports::outbound::{FeedSource, IndexStore};
use crate::scan::domain::{Ecosystem, UnifiedIndex};
use crate::scan::services::IndexBuilder;
use crate::shared::error::ScanError;
use crate::shared::Result;

/// Per-ecosystem outcome of an index build, for the console summary.
#[derive(Debug)]
pub struct EcosystemResult {
    pub ecosystem: Ecosystem,
    pub packages: usize,
    pub written: bool,
}

/// Summary of one build-index run.
#[derive(Debug)]
pub struct BuildIndexSummary {
    pub sources_loaded: usize,
    pub failed_sources: Vec<String>,
    pub records_skipped: usize,
    pub ecosystems: Vec<EcosystemResult>,
}

impl BuildIndexSummary {
    pub fn total_packages(&self) -> usize {
        self.ecosystems.iter().map(|e| e.packages).sum()
    }
}

/// BuildIndexUseCase - merge all raw feeds into per-ecosystem unified
/// index files.
///
/// Feeds that fail to load are reported and skipped; a write failure for
/// one ecosystem does not stop the remaining ecosystems from being written.
/// Every known ecosystem gets an index file, empty when no feed reported
/// anything for it.
///
/// # Type Parameters
/// * `F` - FeedSource implementation raw records come from
/// * `S` - IndexStore implementation indexes are persisted through
pub struct BuildIndexUseCase<F: FeedSource, S: IndexStore> {
    feed_source: F,
    index_store: S,
}

impl<F: FeedSource, S: IndexStore> BuildIndexUseCase<F, S> {
    pub fn new(feed_source: F, index_store: S) -> Self {
        Self {
            feed_source,
            index_store,
        }
    }

    pub fn execute(&self) -> Result<BuildIndexSummary> {
        let loaded = self.feed_source.load_feeds()?;
        if loaded.feeds.is_empty() {
            return Err(ScanError::FeedDataMissing.into());
        }

        let outcome = IndexBuilder::merge(&loaded.feeds);

        let mut ecosystems = Vec::new();
        for (ecosystem, index) in &outcome.indexes {
            ecosystems.push(EcosystemResult {
                ecosystem: ecosystem.clone(),
                packages: index.total_packages,
                written: self.store(index),
            });
        }

        // Ecosystems no feed mentioned still get an (empty) index file.
        for ecosystem in Ecosystem::KNOWN {
            if !outcome.indexes.contains_key(&ecosystem) {
                let index = UnifiedIndex::empty(ecosystem.clone());
                ecosystems.push(EcosystemResult {
                    ecosystem,
                    packages: 0,
                    written: self.store(&index),
                });
            }
        }

        Ok(BuildIndexSummary {
            sources_loaded: loaded.feeds.len(),
            failed_sources: loaded.failed_sources,
            records_skipped: outcome.records_skipped,
            ecosystems,
        })
    }

    fn store(&self, index: &UnifiedIndex) -> bool {
        match self.index_store.store(index) {
            Ok(()) => true,
            Err(e) => {
                eprintln!(
                    "⚠️  Warning: failed to write index for {}: {}",
                    index.ecosystem, e
                );
                false
            }
        }
    }
}
