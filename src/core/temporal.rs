//! ISO-8601 detection and parsing shared by the normalizer and the binder.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

lazy_static::lazy_static! {
    static ref DATE_TIME_PATTERN: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(:\d{2}(\.\d{1,9})?)?(Z|[+-]\d{2}:?\d{2})?$"
    ).unwrap();
    static ref DATE_PATTERN: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref TIME_PATTERN: Regex = Regex::new(r"^\d{2}:\d{2}(:\d{2}(\.\d{1,9})?)?$").unwrap();
}

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

pub fn looks_like_date_time(s: &str) -> bool {
    DATE_TIME_PATTERN.is_match(s)
}

pub fn looks_like_date(s: &str) -> bool {
    DATE_PATTERN.is_match(s)
}

pub fn looks_like_time(s: &str) -> bool {
    TIME_PATTERN.is_match(s)
}

/// Parse an ISO-8601 date-time. Offsets are folded into UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_utc());
        }
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Like [`parse_timestamp`] but also accepts a bare date (midnight).
pub fn parse_timestamp_lenient(s: &str) -> Option<NaiveDateTime> {
    parse_timestamp(s).or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Date out of either a date or a date-time literal.
pub fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    parse_date(s).or_else(|| parse_timestamp(s).map(|ts| ts.date()))
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

pub fn parse_time_lenient(s: &str) -> Option<NaiveTime> {
    parse_time(s).or_else(|| parse_timestamp(s).map(|ts| ts.time()))
}

pub fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

pub fn format_time(t: &NaiveTime) -> String {
    t.format("%H:%M:%S%.f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert!(looks_like_date_time("2024-05-17T10:30:00Z"));
        assert!(looks_like_date_time("2024-05-17 10:30:00.123"));
        assert!(looks_like_date_time("2024-05-17T10:30:00+02:00"));
        assert!(!looks_like_date_time("2024-05-17"));
        assert!(looks_like_date("2024-05-17"));
        assert!(looks_like_time("10:30"));
        assert!(!looks_like_time("10h30"));
    }

    #[test]
    fn test_offsets_fold_into_utc() {
        let ts = parse_timestamp("2024-05-17T10:30:00+02:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-17T08:30:00");
    }

    #[test]
    fn test_pattern_match_but_invalid_calendar_date() {
        assert!(looks_like_date("2024-13-45"));
        assert!(parse_date("2024-13-45").is_none());
    }

    #[test]
    fn test_epoch_millis() {
        let ts = from_epoch_millis(0).unwrap();
        assert_eq!(format_timestamp(&ts), "1970-01-01T00:00:00");
    }
}
