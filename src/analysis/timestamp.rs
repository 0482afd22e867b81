//! Click timestamp parsing.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Formats tried after RFC 3339, all with a numeric offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Formats for timestamps that carry no offset; these are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO-8601 style timestamp into a UTC instant.
///
/// `2021-03-15T10:30:00Z`, `2021-03-15T10:30:00+00:00` and
/// `2021-03-15 10:30:00+0000` all denote the same instant. Seconds may be
/// omitted, and a bare date means midnight UTC. Returns `None` when no
/// accepted encoding matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{}+00:00", rest),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whether `instant` falls in calendar year `year`, measured in UTC.
pub fn in_year(instant: &DateTime<Utc>, year: i32) -> bool {
    instant.year() == year
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_suffix_and_offset_are_equivalent() {
        let z = parse_timestamp("2021-03-15T10:30:00Z").unwrap();
        let offset = parse_timestamp("2021-03-15T10:30:00+00:00").unwrap();
        let compact = parse_timestamp("2021-03-15T10:30:00+0000").unwrap();
        assert_eq!(z, offset);
        assert_eq!(z, compact);
    }

    #[test]
    fn test_space_separator_and_fraction() {
        let expected = parse_timestamp("2021-03-15T10:30:00Z").unwrap();
        assert_eq!(parse_timestamp("2021-03-15 10:30:00+00:00"), Some(expected));
        assert!(parse_timestamp("2021-03-15T10:30:00.123456Z").is_some());
    }

    #[test]
    fn test_naive_is_read_as_utc() {
        let naive = parse_timestamp("2021-06-15T12:00:00").unwrap();
        let utc = parse_timestamp("2021-06-15T12:00:00Z").unwrap();
        assert_eq!(naive, utc);
    }

    #[test]
    fn test_invalid_timestamps() {
        assert_eq!(parse_timestamp("not-a-date"), None);
        assert_eq!(parse_timestamp("invalid_timestamp"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2021-13-01T00:00:00Z"), None);
        assert_eq!(parse_timestamp("2021-03-15T10"), None);
        assert_eq!(parse_timestamp("2021-02-30"), None);
        assert_eq!(parse_timestamp("15/03/2021"), None);
    }

    #[test]
    fn test_minute_precision() {
        let expected = parse_timestamp("2021-03-15T10:30:00Z").unwrap();
        assert_eq!(parse_timestamp("2021-03-15T10:30Z"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15T10:30+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15T10:30+0000"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15 10:30+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15T10:30"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15 10:30"), Some(expected));

        let shifted = parse_timestamp("2021-03-15T11:30+01:00").unwrap();
        assert_eq!(shifted, expected);
    }

    #[test]
    fn test_date_only_is_midnight_utc() {
        let date = parse_timestamp("2021-03-15").unwrap();
        assert_eq!(date, parse_timestamp("2021-03-15T00:00:00Z").unwrap());
        assert!(in_year(&parse_timestamp("2021-01-01").unwrap(), 2021));
    }

    #[test]
    fn test_year_boundaries() {
        let start = parse_timestamp("2021-01-01T00:00:00+00:00").unwrap();
        let end = parse_timestamp("2021-12-31T23:59:59+00:00").unwrap();
        let before = parse_timestamp("2020-12-31T23:59:59Z").unwrap();
        let after = parse_timestamp("2022-01-01T00:00:00Z").unwrap();

        assert!(in_year(&start, 2021));
        assert!(in_year(&end, 2021));
        assert!(!in_year(&before, 2021));
        assert!(!in_year(&after, 2021));
    }

    #[test]
    fn test_year_is_measured_in_utc() {
        // 00:30 local at +01:00 is still 2020 in UTC.
        let early = parse_timestamp("2021-01-01T00:30:00+01:00").unwrap();
        assert!(!in_year(&early, 2021));
        assert!(in_year(&early, 2020));

        // 20:00 local at -05:00 is already 2022 in UTC.
        let late = parse_timestamp("2021-12-31T20:00:00-05:00").unwrap();
        assert!(!in_year(&late, 2021));
    }
}
