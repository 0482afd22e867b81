//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::pipeline::SUPPORTED_YEARS;
use clap::Parser;
use std::path::PathBuf;

/// clickcount - yearly clicks per shortened link
///
/// Reads a link registry (CSV with `long_url` and `hash` columns) and a
/// click log (JSON array of events with `bitlink`/`bitlink_hash` and
/// `timestamp`), and prints the number of clicks each long URL received in
/// one calendar year, most clicked first.
///
/// Examples:
///   clickcount
///   clickcount --encodes data/encodes.csv --decodes data/decodes.json
///   clickcount --year 2020 --compact -o clicks.json
///   clickcount --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Link registry CSV file
    ///
    /// Defaults to the config file value, or encodes.csv.
    #[arg(long, value_name = "FILE")]
    pub encodes: Option<PathBuf>,

    /// Click events JSON file
    ///
    /// Defaults to the config file value, or decodes.json.
    #[arg(long, value_name = "FILE")]
    pub decodes: Option<PathBuf>,

    /// Calendar year (UTC) to count clicks for
    ///
    /// Defaults to the config file value, or 2021.
    #[arg(short, long, value_name = "YEAR", env = "CLICKCOUNT_YEAR")]
    pub year: Option<i32>,

    /// Write the JSON result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the JSON result on a single line
    #[arg(long)]
    pub compact: bool,

    /// Sum clicks of different hashes that point at the same long URL
    #[arg(long)]
    pub merge_by_url: bool,

    /// Exit with code 2 if any record was skipped
    ///
    /// Useful for CI pipelines that must not silently drop data.
    #[arg(long)]
    pub strict: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .clickcount.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no summary)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .clickcount.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(year) = self.year {
            if !SUPPORTED_YEARS.contains(&year) {
                return Err(format!(
                    "Year must be between {} and {}, got {}",
                    SUPPORTED_YEARS.start(),
                    SUPPORTED_YEARS.end(),
                    year
                ));
            }
        }

        for (flag, path) in [
            ("--encodes", &self.encodes),
            ("--decodes", &self.decodes),
            ("--output", &self.output),
        ] {
            if matches!(path, Some(p) if p.as_os_str().is_empty()) {
                return Err(format!("{} must not be empty", flag));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
