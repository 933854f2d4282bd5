//! Display and wire formatting for event datetimes.
//!
//! The backend speaks `"YYYY-MM-DD HH:MM:SS"`; responses occasionally carry
//! ISO-8601 variants instead, so parsing is lenient and display falls back to
//! the raw string when nothing matches.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// The datetime format the backend expects in event payloads.
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_api_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, API_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

pub fn format_to_api_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(API_DATETIME_FORMAT).to_string()
}

/// Human-readable form, e.g. "Wed, 01 May 2024 · 18:00". Unparseable input is
/// shown as-is.
pub fn format_event_datetime(raw: &str) -> String {
    match parse_api_datetime(raw) {
        Some(dt) => dt.format("%a, %d %b %Y · %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{raw}': expected YYYY-MM-DD"))
}

/// Validate and normalize a user-supplied event datetime for the API.
pub fn normalize_datetime_arg(raw: &str) -> Result<String, String> {
    parse_api_datetime(raw)
        .map(|dt| format_to_api_datetime(&dt))
        .ok_or_else(|| {
            format!("Invalid datetime '{raw}': expected YYYY-MM-DD HH:MM[:SS]")
        })
}
