//! Click event aggregation.
//!
//! The events file is a JSON array that can be large, so it is walked one
//! element at a time with a sequence visitor instead of being loaded into a
//! `Vec` first. Each element is classified into an [`EventOutcome`] and
//! valid events in the target year are counted per identifier.

use super::timestamp::{in_year, parse_timestamp};
use crate::error::PipelineError;
use crate::models::{ClickEvent, CountTable, Diagnostics, EventOutcome, InputKind, SkipReason};
use serde::de::{SeqAccess, Visitor};
use serde::Deserializer as _;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Read;
use tracing::{debug, info};

const HASH_FIELD: &str = "bitlink_hash";
const BITLINK_FIELD: &str = "bitlink";
const TIMESTAMP_FIELD: &str = "timestamp";

/// Output of the aggregation stage.
#[derive(Debug, Default)]
pub struct AggregatedClicks {
    pub counts: CountTable,
    /// Array elements seen, including skipped ones.
    pub events_read: usize,
    pub events_in_year: usize,
    pub events_outside_year: usize,
    pub events_skipped: usize,
}

/// Count clicks per identifier for `target_year` from a JSON array.
pub fn aggregate_events<R: Read>(
    reader: R,
    target_year: i32,
    diagnostics: &mut Diagnostics,
) -> Result<AggregatedClicks, PipelineError> {
    let mut aggregator = EventAggregator {
        target_year,
        diagnostics,
        clicks: AggregatedClicks::default(),
    };

    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    (&mut deserializer)
        .deserialize_seq(EventSeqVisitor {
            aggregator: &mut aggregator,
        })
        .and_then(|()| deserializer.end())
        .map_err(json_error)?;

    let clicks = aggregator.clicks;
    info!(
        "Parsed {} events, {} click events from {}",
        clicks.events_read, clicks.events_in_year, target_year
    );
    debug!(
        "{} events outside {}, {} skipped, {} clicks across {} unique hashes",
        clicks.events_outside_year,
        target_year,
        clicks.events_skipped,
        clicks.counts.total(),
        clicks.counts.len()
    );

    Ok(clicks)
}

/// Classify one raw array element.
pub fn classify_event(value: Value) -> EventOutcome {
    let object = match value {
        Value::Object(object) => object,
        other => {
            return EventOutcome::Skipped(SkipReason::MalformedRecord(format!(
                "expected an object, found {}",
                json_type_name(&other)
            )))
        }
    };

    let identifier = match extract_identifier(&object) {
        Ok(identifier) => identifier,
        Err(reason) => return EventOutcome::Skipped(reason),
    };

    let raw_timestamp = match string_field(&object, TIMESTAMP_FIELD) {
        Ok(ts) => ts,
        Err(reason) => return EventOutcome::Skipped(reason),
    };

    match parse_timestamp(raw_timestamp) {
        Some(timestamp) => EventOutcome::Valid(ClickEvent {
            identifier,
            timestamp,
        }),
        None => EventOutcome::Skipped(SkipReason::InvalidTimestamp {
            value: raw_timestamp.to_string(),
        }),
    }
}

/// Use `bitlink_hash` when present, otherwise take the path of `bitlink`.
fn extract_identifier(object: &Map<String, Value>) -> Result<String, SkipReason> {
    if object.contains_key(HASH_FIELD) {
        return string_field(object, HASH_FIELD).map(str::to_string);
    }

    let bitlink = string_field(object, BITLINK_FIELD).map_err(|reason| match reason {
        SkipReason::MissingField(_) => SkipReason::MissingField(HASH_FIELD),
        other => other,
    })?;

    let invalid = || SkipReason::InvalidBitlink {
        value: bitlink.to_string(),
    };
    let parsed = url::Url::parse(bitlink).map_err(|_| invalid())?;
    let hash = parsed.path().trim_start_matches('/');
    if hash.is_empty() {
        return Err(invalid());
    }
    Ok(hash.to_string())
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SkipReason> {
    match object.get(field) {
        Some(Value::String(s)) if s.trim().is_empty() => Err(SkipReason::EmptyField(field)),
        Some(Value::String(s)) => Ok(s.trim()),
        None | Some(Value::Null) => Err(SkipReason::MissingField(field)),
        Some(other) => Err(SkipReason::MalformedRecord(format!(
            "'{}' is {}, not a string",
            field,
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn json_error(err: serde_json::Error) -> PipelineError {
    if err.is_io() {
        let source = std::io::Error::from(err);
        return PipelineError::Io {
            input: InputKind::ClickEvents,
            source,
        };
    }
    PipelineError::schema(InputKind::ClickEvents, err.to_string())
}

struct EventAggregator<'d> {
    target_year: i32,
    diagnostics: &'d mut Diagnostics,
    clicks: AggregatedClicks,
}

impl EventAggregator<'_> {
    fn record(&mut self, value: Value) {
        self.clicks.events_read += 1;
        let position = self.clicks.events_read;

        match classify_event(value) {
            EventOutcome::Valid(event) if in_year(&event.timestamp, self.target_year) => {
                self.clicks.counts.increment(&event.identifier);
                self.clicks.events_in_year += 1;
            }
            EventOutcome::Valid(_) => {
                self.clicks.events_outside_year += 1;
            }
            EventOutcome::Skipped(reason) => {
                self.clicks.events_skipped += 1;
                self.diagnostics
                    .push(InputKind::ClickEvents, Some(position), reason);
            }
        }
    }
}

struct EventSeqVisitor<'a, 'd> {
    aggregator: &'a mut EventAggregator<'d>,
}

impl<'de> Visitor<'de> for EventSeqVisitor<'_, '_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a JSON array of click events")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(value) = seq.next_element::<Value>()? {
            self.aggregator.record(value);
        }
        Ok(())
    }
}
