//! Epoch-millisecond helpers and the two date-time text formats that end up
//! on disk: the mirror's `时间` field and the export file name stamp.
//!
//! Both formats are wall-clock time without an offset, so the functions
//! take the time zone explicitly. Callers in the app pass `chrono::Local`;
//! tests pass `Utc` to stay deterministic.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::fmt::Display;

/// Mirror document date-time pattern (`YYYY-MM-DD HH:MM:SS`).
pub const MIRROR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Export file name stamp (`YYYY-MM-DD_HH.mm.ss`).
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts epoch milliseconds to a zoned date-time.
///
/// Out-of-range values clamp to the epoch.
pub fn millis_to_datetime<Tz: TimeZone>(millis: i64, tz: &Tz) -> DateTime<Tz> {
    let utc = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH);
    utc.with_timezone(tz)
}

/// Formats epoch milliseconds with the mirror pattern.
pub fn format_mirror_time<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    millis_to_datetime(millis, tz)
        .format(MIRROR_TIME_FORMAT)
        .to_string()
}

/// Parses a mirror date-time string back to epoch milliseconds.
///
/// Returns `None` if the text does not match the pattern, names a
/// wall-clock time that does not exist in `tz`, or lies before the epoch.
/// Ambiguous wall-clock times (DST fall-back) resolve to the earlier
/// instant.
pub fn parse_mirror_time<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), MIRROR_TIME_FORMAT).ok()?;
    let millis = tz.from_local_datetime(&naive).earliest()?.timestamp_millis();
    (millis >= 0).then_some(millis)
}

/// Formats a date-time with the export file name pattern.
pub fn format_export_stamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format(EXPORT_TIME_FORMAT).to_string()
}
