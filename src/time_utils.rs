// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Start of the given calendar day as a Whoop query parameter.
pub fn day_start_param(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// End of the given calendar day as a Whoop query parameter.
pub fn day_end_param(date: NaiveDate) -> String {
    format!("{}T23:59:59.999Z", date.format("%Y-%m-%d"))
}

/// UTC calendar date of an RFC3339 timestamp, or None if unparseable.
pub fn utc_date_of(timestamp: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(day_start_param(date), "2024-03-07T00:00:00.000Z");
        assert_eq!(day_end_param(date), "2024-03-07T23:59:59.999Z");
    }

    #[test]
    fn test_utc_date_truncation() {
        // 23:30 UTC stays on the same calendar date
        let date = utc_date_of("2024-03-07T23:30:00.000Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());

        // offset timestamps are normalized to UTC before truncating
        let date = utc_date_of("2024-03-07T20:30:00-08:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
    }

    #[test]
    fn test_utc_date_of_rejects_garbage() {
        assert!(utc_date_of("not-a-timestamp").is_none());
        assert!(utc_date_of("").is_none());
    }
}
