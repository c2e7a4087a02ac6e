/// Transformation services over the domain types. These stay pure where
/// possible; the ones that touch the filesystem (detection, extraction,
/// the IoC walk) never mutate it.
pub mod database;
pub mod dependency_extractor;
pub mod ecosystem_detector;
pub mod index_builder;
pub mod ioc_detector;
pub mod version_matcher;

pub use database::PackageDatabase;
pub use index_builder::{IndexBuilder, MergeOutcome};
pub use ioc_detector::{IocDetector, IocScanOutcome};
