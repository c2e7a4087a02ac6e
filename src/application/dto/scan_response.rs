use crate::scan::domain::{Ecosystem, ScanReport};

/// ScanResponse DTO - output of the scan use case: the assembled report
/// plus the ecosystems that were actually scanned.
#[derive(Debug)]
pub struct ScanResponse {
    pub report: ScanReport,
    pub ecosystems: Vec<Ecosystem>,
}
