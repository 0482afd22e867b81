//! Data models for the click counter.
//!
//! This module contains the records flowing through the pipeline, the
//! tables built by each stage, and the diagnostics collected along the way.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Which input a record or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// The CSV mapping short identifiers to destination URLs.
    LinkRegistry,
    /// The JSON array of click events.
    ClickEvents,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::LinkRegistry => write!(f, "link registry"),
            InputKind::ClickEvents => write!(f, "click events"),
        }
    }
}

/// One row of the link registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Short identifier (the `hash` column).
    pub identifier: String,
    /// Destination URL (the `long_url` column).
    pub destination_url: String,
}

/// A click event that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub identifier: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Result of classifying a raw event record.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Valid(ClickEvent),
    Skipped(SkipReason),
}

/// Why a record was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required field was absent or null.
    MissingField(&'static str),
    /// A required field was present but blank.
    EmptyField(&'static str),
    /// The identifier was already mapped; the older URL was replaced.
    DuplicateIdentifier {
        identifier: String,
        replaced_url: String,
    },
    /// The timestamp matched none of the accepted encodings.
    InvalidTimestamp { value: String },
    /// The bitlink URL had no usable path.
    InvalidBitlink { value: String },
    /// The record could not be decoded at all.
    MalformedRecord(String),
    /// Clicks were counted for an identifier the registry does not know.
    UnmatchedIdentifier { identifier: String, count: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing '{}'", field),
            SkipReason::EmptyField(field) => write!(f, "empty '{}'", field),
            SkipReason::DuplicateIdentifier {
                identifier,
                replaced_url,
            } => write!(
                f,
                "duplicate hash '{}' (replaces {})",
                identifier, replaced_url
            ),
            SkipReason::InvalidTimestamp { value } => {
                write!(f, "invalid timestamp format: {}", value)
            }
            SkipReason::InvalidBitlink { value } => {
                write!(f, "could not extract hash from bitlink: {}", value)
            }
            SkipReason::MalformedRecord(detail) => write!(f, "malformed record: {}", detail),
            SkipReason::UnmatchedIdentifier { identifier, count } => write!(
                f,
                "no matching long URL for hash '{}' ({} clicks dropped)",
                identifier, count
            ),
        }
    }
}

/// A single non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Input the record belongs to.
    pub input: InputKind,
    /// 1-based row or element number; `None` for join-time diagnostics.
    pub position: Option<usize>,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} #{}: {}", self.input, pos, self.reason),
            None => write!(f, "{}: {}", self.input, self.reason),
        }
    }
}

/// Collector for non-fatal diagnostics, returned with the results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    records: Vec<SkippedRecord>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, input: InputKind, position: Option<usize>, reason: SkipReason) {
        let record = SkippedRecord {
            input,
            position,
            reason,
        };
        tracing::warn!("{}", record);
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkippedRecord> {
        self.records.iter()
    }

    /// Number of diagnostics attributed to one input.
    pub fn count_for(&self, input: InputKind) -> usize {
        self.records.iter().filter(|r| r.input == input).count()
    }
}

/// Identifier to destination URL lookup, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierMap {
    entries: HashMap<String, String>,
}

impl IdentifierMap {
    /// Insert a record, returning the URL it replaced, if any.
    pub(crate) fn insert(&mut self, record: LinkRecord) -> Option<String> {
        self.entries
            .insert(record.identifier, record.destination_url)
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LinkRecord> for IdentifierMap {
    fn from_iter<I: IntoIterator<Item = LinkRecord>>(iter: I) -> Self {
        let mut map = Self::default();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

/// Per-identifier click counts in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    index: HashMap<String, usize>,
    counts: Vec<(String, u64)>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one click for `identifier`.
    pub fn increment(&mut self, identifier: &str) {
        match self.index.get(identifier) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index
                    .insert(identifier.to_string(), self.counts.len());
                self.counts.push((identifier.to_string(), 1));
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, identifier: &str) -> Option<u64> {
        self.index.get(identifier).map(|&slot| self.counts[slot].1)
    }

    /// Identifiers with their counts, in the order they were first counted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// One line of the final output.
///
/// Serializes as a single-key object: `{"https://example.com": 3}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub destination_url: String,
    pub count: u64,
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.destination_url, &self.count)?;
        map.end()
    }
}

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Data rows read from the link registry.
    pub rows_read: usize,
    /// Distinct identifiers in the loaded map.
    pub links_loaded: usize,
    /// Rows that replaced an earlier mapping.
    pub duplicate_links: usize,
    /// Elements read from the click events array.
    pub events_read: usize,
    /// Events counted for the target year.
    pub events_in_year: usize,
    /// Valid events from other years.
    pub events_outside_year: usize,
    /// Events dropped as invalid.
    pub events_skipped: usize,
    /// Counted identifiers with no registry entry.
    pub unmatched_identifiers: usize,
    /// Records in the final output.
    pub results: usize,
}
