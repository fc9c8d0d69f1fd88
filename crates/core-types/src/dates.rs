use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

/// Naive layouts accepted when the journal stored a timestamp without an offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a trade timestamp as written in the journal.
///
/// The returned value keeps the offset the timestamp was written with, so its
/// calendar date is the literal date of the input. Timestamps without an offset
/// (and bare `YYYY-MM-DD` dates) are read as UTC.
///
/// Returns `None` for empty or unparseable input; callers treat that the same
/// as a trade with no date at all.
pub fn parse_trade_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp);
    }

    let utc = FixedOffset::east_opt(0)?;
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| utc.from_utc_datetime(&naive))
}
