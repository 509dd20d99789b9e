// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Display label for a calendar day, e.g. "May 1, 2023".
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_label() {
        let date = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(format_day_label(date), "May 1, 2023");
    }

    #[test]
    fn test_rfc3339_z_suffix() {
        let date = DateTime::from_timestamp(1_682_899_200, 0).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2023-05-01T00:00:00Z");
    }
}
