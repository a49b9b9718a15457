// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Label used for anything less than a minute old.
pub const JUST_NOW: &str = "Just now";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Relative "time ago" label for a feed row.
///
/// Minute resolution; anything under a minute (including clock skew into
/// the future) is "Just now". From one week on, the absolute date is shown.
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - timestamp;
    if elapsed < Duration::minutes(1) {
        return JUST_NOW.to_string();
    }
    if elapsed >= Duration::weeks(1) {
        return timestamp.format("%b %-d, %Y").to_string();
    }

    let (count, unit) = if elapsed < Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
