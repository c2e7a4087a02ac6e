use std::path::{Path, PathBuf};
use std::process;

use chrono::Utc;

use wormguard::adapters::outbound::console::summary;
use wormguard::adapters::outbound::filesystem::{
    FileSystemFeedSource, FileSystemIndexStore, FileSystemWriter, StdoutPresenter,
};
use wormguard::application::dto::ScanRequest;
use wormguard::application::use_cases::{BuildIndexUseCase, RunScanUseCase};
use wormguard::cli::{BuildIndexArgs, Cli, Command, ScanArgs};
use wormguard::config::{self, ConfigFile};
use wormguard::ports::outbound::OutputPresenter;
use wormguard::scan::domain::Ecosystem;
use wormguard::shared::error::{ExitCode, ScanError};
use wormguard::shared::{security, Result};

/// Bundled dataset tried when no unified index is available.
const FALLBACK_DATASET: &str = "affected_packages.yaml";

fn main() {
    match run() {
        Ok(code) => process::exit(code.as_i32()),
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    }
}

fn run() -> Result<ExitCode> {
    // clap handles invalid arguments itself and exits with code 2
    let cli = Cli::parse_args();

    match cli.command {
        Command::Scan(args) => run_scan(args),
        Command::BuildIndex(args) => run_build_index(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<ExitCode> {
    let (is_file, target_path) = match &args.file {
        Some(file) => (true, PathBuf::from(file)),
        None => (false, PathBuf::from(args.path.as_deref().unwrap_or("."))),
    };

    if !target_path.exists() {
        return Err(ScanError::PathNotFound { path: target_path }.into());
    }
    if is_file {
        security::validate_regular_file(&target_path, "scan target")?;
    } else {
        validate_scan_directory(&target_path)?;
    }

    let config = load_scan_config(&args, is_file, &target_path)?;

    // CLI flags take precedence over config file values
    let ecosystem = args.ecosystem.clone().or(config.ecosystem.clone());
    let no_ioc = args.no_ioc || config.no_ioc.unwrap_or(false);
    let no_summary = args.no_summary || config.no_summary.unwrap_or(false);
    let output = args.output.clone().or(config.output.clone());
    let index_dir = args
        .index_dir
        .clone()
        .or(config.index_dir.clone())
        .unwrap_or_else(|| "final-data".to_string());

    eprintln!(
        "🔍 Scanning {}: {}",
        if is_file { "file" } else { "directory" },
        target_path.display()
    );

    let mut builder = ScanRequest::builder()
        .ecosystem_override(ecosystem.as_deref().map(Ecosystem::normalize))
        .no_iocs(no_ioc)
        .ioc_only(args.ioc_only);
    builder = if is_file {
        builder.file(&target_path)
    } else {
        builder.directory(&target_path)
    };
    let request = builder.build()?;

    let use_case = RunScanUseCase::new(
        FileSystemIndexStore::new(PathBuf::from(index_dir)),
        Some(PathBuf::from(FALLBACK_DATASET)),
    );
    let response = use_case.execute(request)?;

    if !response.ecosystems.is_empty() {
        eprintln!("🔍 Ecosystem(s): {}", response.report.ecosystem);
    }
    eprintln!(
        "✅ Scanned {} unique package(s)",
        response.report.total_packages_scanned
    );

    present_report(&response.report.to_json()?, output.as_deref())?;

    if !no_summary {
        summary::print_report_summary(&response.report);
    }

    if response.report.malicious_packages_found > 0 {
        eprintln!(
            "\n🚨 {} malicious package(s) detected!",
            response.report.malicious_packages_found
        );
    }
    if response.report.iocs_found > 0 {
        eprintln!("\n🚨 {} IoC(s) detected!", response.report.iocs_found);
    }

    if response.report.malicious_packages_found == 0 && response.report.iocs_found == 0 {
        eprintln!("\n✅ No malicious packages or IoCs detected!");
    }

    if response.report.has_findings() {
        Ok(ExitCode::FindingsDetected)
    } else {
        Ok(ExitCode::Success)
    }
}

fn run_build_index(args: BuildIndexArgs) -> Result<ExitCode> {
    eprintln!("{}", "=".repeat(60));
    eprintln!("Unified Index Builder");
    eprintln!("{}", "=".repeat(60));

    let use_case = BuildIndexUseCase::new(
        FileSystemFeedSource::new(PathBuf::from(&args.raw_dir)),
        FileSystemIndexStore::new(PathBuf::from(&args.out_dir)),
    );
    let summary = use_case.execute()?;

    eprintln!("Loaded data from {} source(s)", summary.sources_loaded);
    for failed in &summary.failed_sources {
        eprintln!("⚠️  Warning: could not load source: {}", failed);
    }
    if summary.records_skipped > 0 {
        eprintln!(
            "⚠️  Warning: skipped {} malformed record(s)",
            summary.records_skipped
        );
    }

    eprintln!();
    for result in &summary.ecosystems {
        let marker = if result.written { "✓" } else { "✗" };
        eprintln!(
            "  {} {}: {} package(s)",
            marker, result.ecosystem, result.packages
        );
    }

    eprintln!();
    eprintln!("{}", "=".repeat(60));
    eprintln!("Summary: {} total packages", summary.total_packages());
    eprintln!("Indexes saved to: {}", args.out_dir);
    eprintln!("{}", "=".repeat(60));

    Ok(ExitCode::Success)
}

fn load_scan_config(args: &ScanArgs, is_file: bool, target_path: &Path) -> Result<ConfigFile> {
    if let Some(path) = &args.config {
        return config::load_config_from_path(Path::new(path));
    }

    let config_dir = if is_file {
        target_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    } else {
        target_path.to_path_buf()
    };
    Ok(config::discover_config(&config_dir)?.unwrap_or_default())
}

/// Writes the report JSON to the requested destination; without an explicit
/// output path, a timestamped file under `scan-output/`.
fn present_report(json: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some("-") => StdoutPresenter::new().present(json),
        Some(path) => FileSystemWriter::new(PathBuf::from(path)).present(json),
        None => {
            let dir = PathBuf::from("scan-output");
            std::fs::create_dir_all(&dir).map_err(|e| ScanError::FileWriteError {
                path: dir.clone(),
                details: e.to_string(),
            })?;
            let filename = format!(
                "malicious_packages_report_{}.json",
                Utc::now().format("%Y%m%d_%H%M%S")
            );
            FileSystemWriter::new(dir.join(filename)).present(json)
        }
    }
}

fn validate_scan_directory(path: &Path) -> Result<()> {
    // Security check: reject symbolic links for scan roots
    let metadata = std::fs::symlink_metadata(path).map_err(|e| ScanError::InvalidScanPath {
        path: path.to_path_buf(),
        reason: format!("Failed to read path metadata: {}", e),
    })?;

    if metadata.is_symlink() {
        return Err(ScanError::InvalidScanPath {
            path: path.to_path_buf(),
            reason: "Security: Scan path is a symbolic link. For security reasons, symbolic links are not allowed.".to_string(),
        }
        .into());
    }

    if !path.is_dir() {
        return Err(ScanError::InvalidScanPath {
            path: path.to_path_buf(),
            reason: "Not a directory".to_string(),
        }
        .into());
    }

    path.canonicalize().map_err(|e| ScanError::InvalidScanPath {
        path: path.to_path_buf(),
        reason: format!("Failed to canonicalize path: {}", e),
    })?;

    Ok(())
}
