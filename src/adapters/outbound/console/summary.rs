use owo_colors::OwoColorize;

use crate::scan::domain::{MatchKind, ScanReport, Severity};

/// Prints a human-readable summary of a scan report to stderr, leaving
/// stdout free for the report JSON itself.
pub fn print_report_summary(report: &ScanReport) {
    eprintln!();
    eprintln!("{}", "=".repeat(60));
    eprintln!("SCAN REPORT SUMMARY");
    eprintln!("{}", "=".repeat(60));
    eprintln!("Ecosystem: {}", report.ecosystem);
    eprintln!("Scanned Path: {}", report.scanned_path);
    eprintln!("Scan Timestamp: {}", report.scan_timestamp);
    eprintln!("Total Packages Scanned: {}", report.total_packages_scanned);
    eprintln!(
        "Malicious Packages Found: {}",
        report.malicious_packages_found
    );
    eprintln!("IoCs Found: {}", report.iocs_found);
    if report.warnings.input_errors > 0 || report.warnings.walk_errors > 0 {
        eprintln!(
            "Warnings: {} input error(s), {} walk error(s)",
            report.warnings.input_errors, report.warnings.walk_errors
        );
    }
    if report.warnings.database_fallback {
        eprintln!("{}", "⚠️  Ran against the bundled fallback database".yellow());
    }
    eprintln!("{}", "=".repeat(60));

    if report.malicious_packages.is_empty() {
        eprintln!("\n{}", "✅ No malicious packages found!".green());
    } else {
        eprintln!("\n{}\n", "🚨 MALICIOUS PACKAGES DETECTED:".red().bold());
        for (i, pkg) in report.malicious_packages.iter().enumerate() {
            let kind = match pkg.match_kind {
                MatchKind::Exact => "CONFIRMED".red().bold().to_string(),
                MatchKind::Potential => "version mismatch".yellow().to_string(),
            };
            eprintln!("{}. {} ({})", i + 1, pkg.name.bold(), kind);
            if !pkg.version.is_empty() {
                eprintln!("   Version: {} in {}", pkg.version, pkg.location);
            }
            eprintln!("   Severity: {}", severity_label(pkg.severity));
            if !pkg.description.is_empty() {
                eprintln!("   Description: {}", pkg.description);
            }
            if !pkg.sources.is_empty() {
                eprintln!("   Sources: {}", pkg.sources.join(", "));
            }
            if !pkg.affected_versions.is_empty() {
                eprintln!("   Affected versions: {}", pkg.affected_versions.join(", "));
            }
            eprintln!();
        }
    }

    if report.iocs.is_empty() {
        eprintln!("{}", "✅ No IoCs detected!".green());
    } else {
        eprintln!(
            "{}\n",
            "🚨 INDICATORS OF COMPROMISE (IoCs) DETECTED:".red().bold()
        );
        for (i, ioc) in report.iocs.iter().enumerate() {
            let marker = if ioc.severity >= Severity::Critical {
                "🔴"
            } else {
                "🟠"
            };
            let variant = ioc
                .variant
                .as_deref()
                .map(|v| format!(" [{v}]"))
                .unwrap_or_default();
            eprintln!(
                "{}. {} {}{}: {}",
                i + 1,
                marker,
                ioc.finding_type.to_uppercase(),
                variant,
                ioc.path
            );
            if let Some(hash) = &ioc.hash {
                eprintln!("   SHA-256: {hash}");
            }
            if let Some(pattern) = &ioc.pattern {
                eprintln!("   Pattern: {pattern}");
            }
            if let Some(url) = &ioc.url {
                eprintln!("   URL: {url}");
            }
            if let Some(filename) = &ioc.filename {
                eprintln!("   File: {filename}");
            }
            eprintln!();
        }
    }

    eprintln!("{}", "=".repeat(60));
}

fn severity_label(severity: Severity) -> String {
    let text = severity.as_str().to_uppercase();
    match severity {
        Severity::Critical => text.red().bold().to_string(),
        Severity::High => text.red().to_string(),
        Severity::Medium => text.yellow().to_string(),
        Severity::Low => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::domain::ScanWarnings;
    use chrono::TimeZone;

    #[test]
    fn test_summary_does_not_panic_on_empty_report() {
        let report = ScanReport::new(
            chrono::Utc.with_ymd_and_hms(2025, 12, 17, 0, 0, 0).unwrap(),
            "npm".to_string(),
            "/proj".to_string(),
            0,
            &[],
            Vec::new(),
            ScanWarnings::default(),
        );
        // Writes to stderr only; just verify it runs.
        print_report_summary(&report);
    }
}
