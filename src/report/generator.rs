//! Result and summary rendering.
//!
//! The JSON result is the program's only output artifact; the text summary
//! is a human-readable recap written to stderr.

use crate::models::{Diagnostics, InputKind, ResultRecord, RunStats};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// How many diagnostics the summary lists before eliding the rest.
const MAX_LISTED_DIAGNOSTICS: usize = 10;

/// Render the results as a JSON array of `{url: count}` objects.
pub fn generate_json_report(results: &[ResultRecord], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    Ok(json)
}

/// Write rendered JSON to a file, with a trailing newline.
pub fn write_json_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;

    Ok(())
}

/// Generate a text summary of a run.
pub fn generate_summary_text(year: i32, stats: &RunStats, diagnostics: &Diagnostics) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Clicks counted for {}:", year));
    lines.push(format!(
        "- Link registry: {} rows, {} links ({} duplicates)",
        stats.rows_read, stats.links_loaded, stats.duplicate_links
    ));
    lines.push(format!(
        "- Click events: {} read, {} in {}, {} other years, {} skipped",
        stats.events_read,
        stats.events_in_year,
        year,
        stats.events_outside_year,
        stats.events_skipped
    ));
    lines.push(format!("- Unmatched hashes: {}", stats.unmatched_identifiers));
    lines.push(format!("- Results: {}", stats.results));

    if !diagnostics.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Warnings: {} ({} link registry, {} click events)",
            diagnostics.len(),
            diagnostics.count_for(InputKind::LinkRegistry),
            diagnostics.count_for(InputKind::ClickEvents)
        ));

        for record in diagnostics.iter().take(MAX_LISTED_DIAGNOSTICS) {
            lines.push(format!("- {}", record));
        }
        if diagnostics.len() > MAX_LISTED_DIAGNOSTICS {
            lines.push(format!(
                "- ... and {} more",
                diagnostics.len() - MAX_LISTED_DIAGNOSTICS
            ));
        }
    }

    lines.join("\n")
}
