//! Joining click counts with the link registry.

use crate::models::{CountTable, Diagnostics, IdentifierMap, InputKind, ResultRecord, SkipReason};
use std::collections::HashMap;
use tracing::{info, warn};

/// Output of the join stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssembledResults {
    pub records: Vec<ResultRecord>,
    pub unmatched: usize,
}

/// Map counted identifiers to their destination URLs, most clicked first.
///
/// Identifiers missing from `map` are dropped with a diagnostic. Equal
/// counts keep the order in which their identifiers first appeared in the
/// click events. With `merge_by_url`, identifiers sharing a destination are
/// summed into one record placed where the first of them appeared.
pub fn assemble_results(
    map: &IdentifierMap,
    counts: &CountTable,
    merge_by_url: bool,
    diagnostics: &mut Diagnostics,
) -> AssembledResults {
    let mut assembled = AssembledResults::default();

    for (identifier, count) in counts.iter() {
        match map.get(identifier) {
            Some(url) => assembled.records.push(ResultRecord {
                destination_url: url.to_string(),
                count,
            }),
            None => {
                assembled.unmatched += 1;
                diagnostics.push(
                    InputKind::ClickEvents,
                    None,
                    SkipReason::UnmatchedIdentifier {
                        identifier: identifier.to_string(),
                        count,
                    },
                );
            }
        }
    }

    if assembled.unmatched > 0 {
        warn!("Total unmatched hashes: {}", assembled.unmatched);
    }

    if merge_by_url {
        assembled.records = merge_records(assembled.records);
    }

    sort_by_count(&mut assembled.records);
    info!(
        "Mapped {} URLs with click counts",
        assembled.records.len()
    );

    assembled
}

/// Stable sort, highest count first.
pub fn sort_by_count(records: &mut [ResultRecord]) {
    records.sort_by(|a, b| b.count.cmp(&a.count));
}

/// Sum records with the same destination, keeping first-seen position.
fn merge_records(records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<ResultRecord> = Vec::with_capacity(records.len());

    for record in records {
        match slots.get(&record.destination_url) {
            Some(&slot) => merged[slot].count += record.count,
            None => {
                slots.insert(record.destination_url.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkRecord;

    fn registry(pairs: &[(&str, &str)]) -> IdentifierMap {
        pairs
            .iter()
            .map(|(id, url)| LinkRecord {
                identifier: id.to_string(),
                destination_url: url.to_string(),
            })
            .collect()
    }

    fn counts(ids: &[&str]) -> CountTable {
        let mut table = CountTable::new();
        for id in ids {
            table.increment(id);
        }
        table
    }

    fn record(url: &str, count: u64) -> ResultRecord {
        ResultRecord {
            destination_url: url.to_string(),
            count,
        }
    }

    #[test]
    fn test_unmatched_hashes_are_dropped() {
        let map = registry(&[
            ("a1b2c3", "https://google.com"),
            ("d4e5f6", "https://twitter.com"),
            ("g7h8i9", "https://example.com"),
        ]);
        let table = counts(&["a1b2c3", "a1b2c3", "xyz789", "d4e5f6", "d4e5f6", "a1b2c3"]);
        let mut diagnostics = Diagnostics::new();

        let assembled = assemble_results(&map, &table, false, &mut diagnostics);

        assert_eq!(
            assembled.records,
            vec![
                record("https://google.com", 3),
                record("https://twitter.com", 2)
            ]
        );
        assert_eq!(assembled.unmatched, 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_no_matches_gives_empty_result() {
        let map = registry(&[("a1b2c3", "https://google.com")]);
        let mut diagnostics = Diagnostics::new();
        let assembled = assemble_results(&map, &counts(&["xyz789"]), false, &mut diagnostics);
        assert!(assembled.records.is_empty());
    }

    #[test]
    fn test_empty_inputs_give_empty_result() {
        let mut diagnostics = Diagnostics::new();
        let empty_map = IdentifierMap::default();
        let assembled = assemble_results(&empty_map, &counts(&["a", "b"]), false, &mut diagnostics);
        assert!(assembled.records.is_empty());

        let map = registry(&[("a", "https://a.com")]);
        let assembled = assemble_results(&map, &CountTable::new(), false, &mut diagnostics);
        assert!(assembled.records.is_empty());
    }

    #[test]
    fn test_ties_keep_first_encounter_order() {
        let map = registry(&[
            ("ex", "https://example.com"),
            ("go", "https://google.com"),
            ("tw", "https://twitter.com"),
        ]);
        let table = counts(&["tw", "ex", "go", "ex", "go", "ex", "go"]);
        let mut diagnostics = Diagnostics::new();

        let assembled = assemble_results(&map, &table, false, &mut diagnostics);

        assert_eq!(
            assembled.records,
            vec![
                record("https://example.com", 3),
                record("https://google.com", 3),
                record("https://twitter.com", 1),
            ]
        );
    }

    #[test]
    fn test_shared_destination_not_merged_by_default() {
        let map = registry(&[("a", "https://same.com"), ("b", "https://same.com")]);
        let table = counts(&["a", "b", "b"]);
        let mut diagnostics = Diagnostics::new();

        let assembled = assemble_results(&map, &table, false, &mut diagnostics);
        assert_eq!(
            assembled.records,
            vec![record("https://same.com", 2), record("https://same.com", 1)]
        );
    }

    #[test]
    fn test_shared_destination_merged_on_request() {
        let map = registry(&[
            ("a", "https://same.com"),
            ("b", "https://other.com"),
            ("c", "https://same.com"),
        ]);
        let table = counts(&["a", "b", "b", "b", "c", "c"]);
        let mut diagnostics = Diagnostics::new();

        let assembled = assemble_results(&map, &table, true, &mut diagnostics);
        assert_eq!(
            assembled.records,
            vec![record("https://same.com", 3), record("https://other.com", 3)]
        );
    }

    #[test]
    fn test_sort_by_count_is_descending() {
        let mut records = vec![
            record("https://example.com", 1),
            record("https://google.com", 5),
            record("https://twitter.com", 3),
        ];
        sort_by_count(&mut records);
        let counts: Vec<u64> = records.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![5, 3, 1]);
    }
}
