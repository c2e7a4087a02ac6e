use std::path::PathBuf;

use crate::scan::domain::Ecosystem;
use crate::shared::error::ScanError;
use crate::shared::Result;

/// What a scan is pointed at: a project tree, or a single dependency /
/// package-list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    Directory(PathBuf),
    File(PathBuf),
}

impl ScanTarget {
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanTarget::Directory(path) | ScanTarget::File(path) => path,
        }
    }

    /// The directory the IoC walk covers: the target itself, or the file's
    /// containing directory.
    pub fn ioc_root(&self) -> PathBuf {
        match self {
            ScanTarget::Directory(path) => path.clone(),
            ScanTarget::File(path) => path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// ScanRequest DTO - input for the scan use case
///
/// Use the builder to construct: it validates that the request still scans
/// for something.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub target: ScanTarget,
    pub ecosystem_override: Option<Ecosystem>,
    pub scan_iocs: bool,
    pub check_packages: bool,
}

impl ScanRequest {
    pub fn builder() -> ScanRequestBuilder {
        ScanRequestBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ScanRequestBuilder {
    target: Option<ScanTarget>,
    ecosystem_override: Option<Ecosystem>,
    no_iocs: bool,
    ioc_only: bool,
}

impl ScanRequestBuilder {
    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(ScanTarget::Directory(path.into()));
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = Some(ScanTarget::File(path.into()));
        self
    }

    pub fn ecosystem_override(mut self, ecosystem: Option<Ecosystem>) -> Self {
        self.ecosystem_override = ecosystem;
        self
    }

    /// Skip IoC detection (faster execution).
    pub fn no_iocs(mut self, no_iocs: bool) -> Self {
        self.no_iocs = no_iocs;
        self
    }

    /// Only detect IoCs, skip package checking.
    pub fn ioc_only(mut self, ioc_only: bool) -> Self {
        self.ioc_only = ioc_only;
        self
    }

    pub fn build(self) -> Result<ScanRequest> {
        let target = self.target.ok_or_else(|| ScanError::Validation {
            message: "A scan target (directory or file) is required".to_string(),
        })?;

        if self.no_iocs && self.ioc_only {
            return Err(ScanError::Validation {
                message: "--no-ioc and --ioc-only together leave nothing to scan".to_string(),
            }
            .into());
        }

        Ok(ScanRequest {
            target,
            ecosystem_override: self.ecosystem_override,
            scan_iocs: !self.no_iocs,
            check_packages: !self.ioc_only,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = ScanRequest::builder().directory("/proj").build().unwrap();
        assert!(request.scan_iocs);
        assert!(request.check_packages);
        assert!(request.ecosystem_override.is_none());
        assert_eq!(request.target, ScanTarget::Directory(PathBuf::from("/proj")));
    }

    #[test]
    fn test_builder_requires_target() {
        assert!(ScanRequest::builder().build().is_err());
    }

    #[test]
    fn test_builder_rejects_contradictory_modes() {
        let result = ScanRequest::builder()
            .directory("/proj")
            .no_iocs(true)
            .ioc_only(true)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_ioc_root_for_file_target() {
        let target = ScanTarget::File(PathBuf::from("/proj/package.json"));
        assert_eq!(target.ioc_root(), PathBuf::from("/proj"));

        let target = ScanTarget::File(PathBuf::from("package.json"));
        assert_eq!(target.ioc_root(), PathBuf::from("."));
    }
}
