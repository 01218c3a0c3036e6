//! Date parsing and rendering helpers.
//!
//! The remote ledger API stores dates as RFC 3339 strings, but older
//! entries and manual imports also appear as bare `YYYY-MM-DD` dates or
//! epoch-millisecond numbers. Everything in the pipeline goes through the
//! flexible parser here so search, sort, and export all agree on what a
//! date is. Invalid input degrades to `None`; nothing in this module
//! panics.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// List-view rendering, e.g. "03 Jan 2024". Matches what the entry and
/// IMEI screens show, so free-text search against a formatted date works.
pub const DISPLAY_FORMAT: &str = "%d %b %Y";

/// Export rendering for `_F` column specs, e.g. "03/01/2024".
pub const EXPORT_FORMAT: &str = "%d/%m/%Y";

/// Parse a date string to epoch milliseconds.
///
/// Accepts RFC 3339 (with offset or `Z`), a naive `YYYY-MM-DDTHH:MM:SS`
/// timestamp, or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_str_ms(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    None
}

/// Parse a JSON value to epoch milliseconds.
///
/// Strings go through [`parse_str_ms`]; integer values are taken as epoch
/// milliseconds directly. Anything else is not a date.
pub fn parse_value_ms(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_str_ms(s),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn format_ms(ms: i64, format: &str) -> Option<String> {
    let dt = Utc.timestamp_millis_opt(ms).single()?;
    Some(dt.format(format).to_string())
}

/// Render a date value with [`DISPLAY_FORMAT`]. `None` when the value is
/// not a parseable date.
pub fn format_display(value: &Value) -> Option<String> {
    format_ms(parse_value_ms(value)?, DISPLAY_FORMAT)
}

/// Render a date value with an arbitrary strftime format.
pub fn format_with(value: &Value, format: &str) -> Option<String> {
    format_ms(parse_value_ms(value)?, format)
}

/// Render a date value with [`EXPORT_FORMAT`]. `None` when the value is
/// not a parseable date.
pub fn format_export(value: &Value) -> Option<String> {
    format_ms(parse_value_ms(value)?, EXPORT_FORMAT)
}

/// Expand a `(start, end)` date pair to inclusive day bounds as RFC 3339
/// strings: start-of-day for the first date, end-of-day for the second.
/// Used by the orders range query.
pub fn day_bounds(start: &str, end: &str) -> Option<(String, String)> {
    let start_ms = parse_str_ms(start)?;
    let end_ms = parse_str_ms(end)?;

    let start_day = Utc.timestamp_millis_opt(start_ms).single()?.date_naive();
    let end_day = Utc.timestamp_millis_opt(end_ms).single()?.date_naive();

    let start_dt = Utc.from_utc_datetime(&start_day.and_hms_opt(0, 0, 0)?);
    let end_dt = Utc.from_utc_datetime(&end_day.and_hms_milli_opt(23, 59, 59, 999)?);

    Some((start_dt.to_rfc3339(), end_dt.to_rfc3339()))
}

// ===========================================================================
// Tests
// ===========================================================================
