//! Timestamp utilities
//!
//! Timestamps are persisted as RFC 3339 text and dates as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};

use crate::{Error, Result};

/// Current UTC time at storage precision (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for storage.
///
/// Fixed microsecond precision with a `Z` suffix keeps stored values
/// lexically ordered, so `ORDER BY` on the text column is chronological.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC 3339 timestamp
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

/// Parse an optional stored RFC 3339 timestamp
pub fn parse_optional_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_timestamp).transpose()
}

/// Parse an optional stored calendar date
pub fn parse_optional_date(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .as_deref()
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| Error::Internal(format!("Failed to parse date '{}': {}", s, e)))
        })
        .transpose()
}

/// Format a calendar date for storage
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_survives_storage_format() {
        let ts = now();
        let stored = format_timestamp(&ts);
        let parsed = parse_timestamp(&stored).unwrap();
        assert_eq!(parsed, ts);
        assert!(stored.ends_with('Z'));
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_optional_date_parsing() {
        let date = parse_optional_date(Some("2026-03-01".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert!(parse_optional_date(Some("03/01/2026".to_string())).is_err());
    }
}
