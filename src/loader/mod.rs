//! Link registry loading.
//!
//! Reads the `encodes` CSV and builds the identifier to destination URL map.
//! Only the `long_url` and `hash` columns are used; anything else in the
//! header is ignored.

use crate::error::PipelineError;
use crate::models::{Diagnostics, IdentifierMap, InputKind, LinkRecord, SkipReason};
use std::io::Read;
use tracing::{debug, info};

const URL_COLUMN: &str = "long_url";
const HASH_COLUMN: &str = "hash";

/// Output of the loader stage.
#[derive(Debug, Default)]
pub struct LoadedRegistry {
    pub map: IdentifierMap,
    /// Data rows seen, including skipped ones.
    pub rows_read: usize,
    /// Rows that overwrote an earlier mapping.
    pub duplicates: usize,
}

/// Build an [`IdentifierMap`] from CSV data with a header row.
///
/// Rows with a blank hash or URL are skipped. A repeated hash replaces the
/// earlier mapping and is reported as a diagnostic.
pub fn load_identifier_map<R: Read>(
    reader: R,
    diagnostics: &mut Diagnostics,
) -> Result<LoadedRegistry, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| csv_error(e, "could not read header row"))?
        .clone();
    debug!("Link registry header: {:?}", headers);

    let url_idx = column_index(&headers, URL_COLUMN);
    let hash_idx = column_index(&headers, HASH_COLUMN);
    let (url_idx, hash_idx) = match (url_idx, hash_idx) {
        (Some(u), Some(h)) => (u, h),
        _ => {
            let found: Vec<&str> = headers.iter().collect();
            return Err(PipelineError::schema(
                InputKind::LinkRegistry,
                format!(
                    "missing required columns, expected [{}, {}], found {:?}",
                    URL_COLUMN, HASH_COLUMN, found
                ),
            ));
        }
    };

    let mut loaded = LoadedRegistry::default();

    for result in csv_reader.records() {
        loaded.rows_read += 1;
        let row = loaded.rows_read;

        let record = match result {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(csv_error(e, "read failed"));
            }
            Err(e) => {
                diagnostics.push(
                    InputKind::LinkRegistry,
                    Some(row),
                    SkipReason::MalformedRecord(e.to_string()),
                );
                continue;
            }
        };

        let hash = record.get(hash_idx).unwrap_or("");
        let long_url = record.get(url_idx).unwrap_or("");

        if hash.is_empty() {
            diagnostics.push(
                InputKind::LinkRegistry,
                Some(row),
                SkipReason::EmptyField(HASH_COLUMN),
            );
            continue;
        }
        if long_url.is_empty() {
            diagnostics.push(
                InputKind::LinkRegistry,
                Some(row),
                SkipReason::EmptyField(URL_COLUMN),
            );
            continue;
        }

        let replaced = loaded.map.insert(LinkRecord {
            identifier: hash.to_string(),
            destination_url: long_url.to_string(),
        });

        if let Some(replaced_url) = replaced {
            loaded.duplicates += 1;
            diagnostics.push(
                InputKind::LinkRegistry,
                Some(row),
                SkipReason::DuplicateIdentifier {
                    identifier: hash.to_string(),
                    replaced_url,
                },
            );
        }
    }

    info!(
        "Parsed {} rows from link registry, {} unique hash-to-URL mappings",
        loaded.rows_read,
        loaded.map.len()
    );

    Ok(loaded)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Map a csv error to a fatal pipeline error.
fn csv_error(err: csv::Error, what: &str) -> PipelineError {
    let detail = format!("{}: {}", what, err);
    match err.into_kind() {
        csv::ErrorKind::Io(source) => PipelineError::Io {
            input: InputKind::LinkRegistry,
            source,
        },
        _ => PipelineError::schema(InputKind::LinkRegistry, detail),
    }
}
