/// Domain layer - immutable value types passed through the pure
/// transformation services. No I/O happens here.
pub mod dependency;
pub mod ecosystem;
pub mod ioc;
pub mod package_record;
pub mod raw_feed;
pub mod report;
pub mod severity;
pub mod unified_index;

pub use dependency::{InstalledDependency, MatchKind, PackageMatch};
pub use ecosystem::Ecosystem;
pub use ioc::{FileClass, IocFinding, IocPattern, Matcher};
pub use package_record::{PackageRecord, SourceDetail};
pub use raw_feed::{RawFeedFile, RawPackageRecord};
pub use report::{MaliciousPackageEntry, ScanReport, ScanWarnings};
pub use severity::Severity;
pub use unified_index::UnifiedIndex;
