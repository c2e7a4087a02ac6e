//! wormguard - supply-chain worm scanner
//!
//! This library detects known-compromised open-source packages in
//! dependency manifests and lockfiles, surfaces indicator-of-compromise
//! (IoC) artifacts left by a supply-chain worm, and merges independent
//! threat-intelligence feeds into one deduplicated, severity-ranked index
//! per package ecosystem. It follows hexagonal architecture: a pure
//! scanning core behind narrow ports, with filesystem adapters around it.
//!
//! # Architecture
//!
//! - **Domain Layer** (`scan::domain`): immutable value types - records,
//!   findings, reports
//! - **Services** (`scan::services`): matching, merging, extraction, and
//!   IoC detection
//! - **Application Layer** (`application`): use cases and DTOs
//! - **Ports** (`ports`): interface definitions for infrastructure
//! - **Adapters** (`adapters`): concrete implementations of ports
//! - **Shared** (`shared`): common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use wormguard::prelude::*;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<()> {
//! let index_store = FileSystemIndexStore::new(PathBuf::from("final-data"));
//! let use_case = RunScanUseCase::new(index_store, None);
//!
//! let request = ScanRequest::builder()
//!     .directory("/path/to/project")
//!     .build()?;
//! let response = use_case.execute(request)?;
//!
//! println!("{}", response.report.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod ports;
pub mod scan;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::filesystem::{
        FileSystemFeedSource, FileSystemIndexStore, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::application::dto::{ScanRequest, ScanResponse, ScanTarget};
    pub use crate::application::use_cases::{BuildIndexUseCase, RunScanUseCase};
    pub use crate::ports::outbound::{FeedSource, IndexStore, OutputPresenter};
    pub use crate::scan::domain::{
        Ecosystem, InstalledDependency, IocFinding, MatchKind, PackageRecord, RawFeedFile,
        ScanReport, Severity, UnifiedIndex,
    };
    pub use crate::scan::services::{IndexBuilder, IocDetector, PackageDatabase};
    pub use crate::shared::Result;
}
