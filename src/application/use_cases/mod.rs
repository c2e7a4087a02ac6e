/// Use cases module containing application business logic orchestration
mod build_index;
mod run_scan;

pub use build_index::{BuildIndexSummary, BuildIndexUseCase, EcosystemResult};
pub use run_scan::RunScanUseCase;
