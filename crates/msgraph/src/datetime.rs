//! Tolerant timestamp parsing for values emitted by Graph and the identity
//! provider.
//!
//! Different endpoints and API versions emit different shapes: RFC 3339 with
//! an offset, `Z`-suffixed values with seven fractional digits, naive values
//! with no zone, space-separated values, and bare dates. Naive values are
//! taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive layouts tried after RFC 3339, most specific first.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a Graph timestamp, returning `None` when no known layout matches.
pub fn parse_graph_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
