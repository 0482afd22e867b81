//! End-to-end click counting run.
//!
//! Loads the link registry, aggregates click events, and joins the two.
//! Every run builds its own tables; nothing is shared between runs.

use crate::analysis::{aggregate_events, assemble_results};
use crate::error::PipelineError;
use crate::loader::load_identifier_map;
use crate::models::{Diagnostics, InputKind, ResultRecord, RunStats};
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Year counted when nothing else is configured.
pub const DEFAULT_TARGET_YEAR: i32 = 2021;

/// Years a run can be asked to count.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// Where the two inputs live.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Link registry CSV (`long_url`, `hash`).
    pub encodes: PathBuf,
    /// Click events JSON array.
    pub decodes: PathBuf,
}

/// Knobs for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub target_year: i32,
    /// Sum identifiers that point at the same destination URL.
    pub merge_by_url: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_year: DEFAULT_TARGET_YEAR,
            merge_by_url: false,
        }
    }
}

/// A successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Sorted by count, highest first.
    pub results: Vec<ResultRecord>,
    pub diagnostics: Diagnostics,
    pub stats: RunStats,
}

/// Run the pipeline over files on disk.
pub fn run(
    inputs: &PipelineInputs,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    info!("Parsing encodes file: {}", inputs.encodes.display());
    let encodes = open_input(&inputs.encodes, InputKind::LinkRegistry)?;
    info!("Parsing decodes file: {}", inputs.decodes.display());
    let decodes = open_input(&inputs.decodes, InputKind::ClickEvents)?;

    run_from_readers(encodes, decodes, options)
}

/// Run the pipeline over arbitrary readers.
///
/// The registry is read first; a schema error there stops the run before
/// any events are read.
pub fn run_from_readers<E: Read, D: Read>(
    encodes: E,
    decodes: D,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    info!("Counting clicks from {}", options.target_year);
    let mut diagnostics = Diagnostics::new();

    let registry = load_identifier_map(encodes, &mut diagnostics)?;
    if registry.map.is_empty() {
        warn!("Link registry has no usable rows, nothing can be matched");
    }
    let clicks = aggregate_events(decodes, options.target_year, &mut diagnostics)?;
    if clicks.counts.is_empty() {
        info!("No click events from {}", options.target_year);
    }
    let assembled = assemble_results(
        &registry.map,
        &clicks.counts,
        options.merge_by_url,
        &mut diagnostics,
    );

    let stats = RunStats {
        rows_read: registry.rows_read,
        links_loaded: registry.map.len(),
        duplicate_links: registry.duplicates,
        events_read: clicks.events_read,
        events_in_year: clicks.events_in_year,
        events_outside_year: clicks.events_outside_year,
        events_skipped: clicks.events_skipped,
        unmatched_identifiers: assembled.unmatched,
        results: assembled.records.len(),
    };
    debug!("Run stats: {:?}", stats);
    info!("Click counting completed, {} results", stats.results);

    Ok(PipelineOutput {
        results: assembled.records,
        diagnostics,
        stats,
    })
}

fn open_input(path: &Path, input: InputKind) -> Result<BufReader<File>, PipelineError> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PipelineError::SourceNotFound {
                input,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(PipelineError::Io { input, source }),
    }
}
