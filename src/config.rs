//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.clickcount.toml` files.

use crate::pipeline::{PipelineInputs, PipelineOptions, DEFAULT_TARGET_YEAR, SUPPORTED_YEARS};
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".clickcount.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Input file settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Event filter settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Link registry CSV.
    #[serde(default = "default_encodes")]
    pub encodes: PathBuf,

    /// Click events JSON.
    #[serde(default = "default_decodes")]
    pub decodes: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            encodes: default_encodes(),
            decodes: default_decodes(),
        }
    }
}

fn default_encodes() -> PathBuf {
    PathBuf::from("encodes.csv")
}

fn default_decodes() -> PathBuf {
    PathBuf::from("decodes.json")
}

/// Which events are counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Calendar year, in UTC.
    #[serde(default = "default_year")]
    pub year: i32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
        }
    }
}

fn default_year() -> i32 {
    DEFAULT_TARGET_YEAR
}

/// How results are rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print the JSON array.
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Sum hashes that share a long URL into one record.
    #[serde(default)]
    pub merge_by_url: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            merge_by_url: false,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.clickcount.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref encodes) = args.encodes {
            self.input.encodes = encodes.clone();
        }
        if let Some(ref decodes) = args.decodes {
            self.input.decodes = decodes.clone();
        }
        if let Some(year) = args.year {
            self.filter.year = year;
        }

        // Flags only switch behavior on
        if args.compact {
            self.output.pretty = false;
        }
        if args.merge_by_url {
            self.output.merge_by_url = true;
        }
    }

    /// Check values the file format alone cannot rule out.
    ///
    /// Run after [`Config::merge_with_args`], so a bad year is caught no
    /// matter where it came from.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            SUPPORTED_YEARS.contains(&self.filter.year),
            "[filter] year must be between {} and {}, got {}",
            SUPPORTED_YEARS.start(),
            SUPPORTED_YEARS.end(),
            self.filter.year
        );
        for (key, path) in [
            ("[input] encodes", &self.input.encodes),
            ("[input] decodes", &self.input.decodes),
        ] {
            ensure!(!path.as_os_str().is_empty(), "{} must not be empty", key);
        }
        Ok(())
    }

    pub fn pipeline_inputs(&self) -> PipelineInputs {
        PipelineInputs {
            encodes: self.input.encodes.clone(),
            decodes: self.input.decodes.clone(),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            target_year: self.filter.year,
            merge_by_url: self.output.merge_by_url,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        let config = Config::default();
        toml::to_string_pretty(&config).context("Failed to serialize default config")
    }
}
