// ⏰ Temporal Model - timestamps of measurements
//
// Statistics arrive stamped with whatever precision the publisher used:
// a year ("2011"), a month ("2011-03"), a day, or a full datetime.
// Everything is normalised to a NaiveDateTime (no timezone) on the way in,
// and rendered at whole-second precision on the way out.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Output format for timestamps in field results (e.g., "2011-01-03T00:00:00")
pub const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Storage format; keeps sub-second precision when present
pub const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognised timestamp: {0:?}")]
pub struct TimestampError(pub String);

// ============================================================================
// PARSING
// ============================================================================

/// Parse a measurement timestamp.
///
/// Accepted notations:
/// - `2011` → last second of the year
/// - `2011-03` → last second of the month
/// - `2011-03-14` → midnight
/// - `2011-03-14T09:30`, `2011-03-14T09:30:15`, optionally with fractional
///   seconds and with a space instead of `T`
/// - RFC 3339 with an offset, converted to UTC
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, TimestampError> {
    let text = input.trim();
    let err = || TimestampError(input.to_string());

    if is_digits(text, 4) {
        let year: i32 = text.parse().map_err(|_| err())?;
        return end_of_month(year, 12).ok_or_else(err);
    }

    if text.len() == 7 && text.as_bytes()[4] == b'-' && is_digits(&text[..4], 4) && is_digits(&text[5..], 2) {
        let year: i32 = text[..4].parse().map_err(|_| err())?;
        let month: u32 = text[5..].parse().map_err(|_| err())?;
        return end_of_month(year, month).ok_or_else(err);
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }

    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_utc())
        .map_err(|_| err())
}

/// Render a timestamp for field output
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(OUTPUT_FORMAT).to_string()
}

/// Render a timestamp for storage
pub fn format_storage(ts: &NaiveDateTime) -> String {
    ts.format(STORAGE_FORMAT).to_string()
}

fn is_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_digit())
}

fn end_of_month(year: i32, month: u32) -> Option<NaiveDateTime> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last_day = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    last_day.and_hms_opt(23, 59, 59)
}

// ============================================================================
// TESTS
// ============================================================================
