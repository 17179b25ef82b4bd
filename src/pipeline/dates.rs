//! Hub timestamp normalisation to plain calendar dates.

use chrono::{DateTime, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Normalise an RFC 3339 timestamp (`2024-03-05T10:00:00Z`) to `2024-03-05`.
///
/// A missing or unparsable timestamp falls back to today's UTC date.
pub fn normalize_date(timestamp: Option<&str>) -> String {
    normalize_date_at(timestamp, Utc::now().date_naive())
}

/// Same as [`normalize_date`] with an explicit fallback date.
pub fn normalize_date_at(timestamp: Option<&str>, today: NaiveDate) -> String {
    timestamp
        .and_then(parse_timestamp)
        .unwrap_or(today)
        .format(DATE_FORMAT)
        .to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    // Already a bare date.
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
