use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::InputError;

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

enum Parsed {
    Instant(DateTime<Utc>),
    Date(NaiveDate),
}

fn parse_raw(raw: &str) -> Result<Parsed, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::InvalidDate(raw.to_string()));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Parsed::Instant(parsed.with_timezone(&Utc)));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Parsed::Instant(naive.and_utc()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Parsed::Date(date));
    }
    Err(InputError::InvalidDate(raw.to_string()))
}

/// Permissive date parsing for window starts and dataset timestamps.
///
/// Accepts a timestamp with an explicit offset (converted to UTC), a naive
/// datetime (assumed UTC), or a bare date (midnight UTC).
pub fn parse_date_utc(raw: &str) -> Result<DateTime<Utc>, InputError> {
    match parse_raw(raw)? {
        Parsed::Instant(instant) => Ok(instant),
        Parsed::Date(date) => Ok(date.and_time(NaiveTime::MIN).and_utc()),
    }
}

/// Like `parse_date_utc`, but a bare date names the END of an inclusive
/// window, so it expands to the day's last second. Explicit timestamps are
/// taken as-is.
pub fn parse_end_date_utc(raw: &str) -> Result<DateTime<Utc>, InputError> {
    match parse_raw(raw)? {
        Parsed::Instant(instant) => Ok(instant),
        Parsed::Date(date) => {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
            Ok(date.and_time(end_of_day).and_utc())
        }
    }
}

/// Truncate to the UTC day boundary (midnight).
pub fn floor_to_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Truncate to the first instant of the UTC month.
pub fn floor_to_month(ts: DateTime<Utc>) -> DateTime<Utc> {
    let date = ts.date_naive();
    let first = date.with_day(1).unwrap_or(date);
    first.and_time(NaiveTime::MIN).and_utc()
}

/// Serialize with second precision and an explicit Z suffix.
pub fn format_ts_utc(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
