use clap::{Args as ClapArgs, Parser, Subcommand};

/// Scan dependency manifests for compromised packages and supply-chain
/// worm IoCs, and build unified threat-feed indexes
#[derive(Parser, Debug)]
#[command(name = "wormguard")]
#[command(version)]
#[command(about = "Detect compromised packages and supply-chain worm IoCs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a project directory or dependency file
    Scan(ScanArgs),
    /// Merge raw threat-feed files into unified per-ecosystem indexes
    BuildIndex(BuildIndexArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ScanArgs {
    /// Path to the directory to scan
    pub path: Option<String>,

    /// Path to a single file to scan instead of a directory
    /// (a manifest/lockfile, or a generic package list)
    #[arg(short, long, value_name = "FILE", conflicts_with = "path")]
    pub file: Option<String>,

    /// Ecosystem to scan, overriding auto-detection
    #[arg(short, long, value_parser = ["npm", "pypi", "maven", "rubygems", "go", "cargo"])]
    pub ecosystem: Option<String>,

    /// Output path for the report JSON; "-" writes to stdout
    /// (default: scan-output/malicious_packages_report_<timestamp>.json)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Skip printing the report summary
    #[arg(long)]
    pub no_summary: bool,

    /// Skip IoC scanning for faster execution
    #[arg(long)]
    pub no_ioc: bool,

    /// Only scan for IoCs, skip package dependency checking
    #[arg(long, conflicts_with = "no_ioc")]
    pub ioc_only: bool,

    /// Directory containing unified_{ecosystem}.json index files
    #[arg(long, value_name = "DIR")]
    pub index_dir: Option<String>,

    /// Explicit config file path (default: wormguard.config.yml in the
    /// scanned directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct BuildIndexArgs {
    /// Directory containing raw {source}.json feed files
    #[arg(long, value_name = "DIR", default_value = "raw-data")]
    pub raw_dir: String,

    /// Directory the unified index files are written to
    #[arg(long, value_name = "DIR", default_value = "final-data")]
    pub out_dir: String,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
