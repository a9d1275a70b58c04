//! Display helpers for note list rows.

use chrono::{Local, TimeZone};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Relative label for timestamps within the last week, `None` beyond that
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> Option<String> {
    let diff = now_ms.saturating_sub(timestamp_ms).max(0);

    if diff < MINUTE_MS {
        Some("just now".to_string())
    } else if diff < HOUR_MS {
        Some(format!("{}m ago", diff / MINUTE_MS))
    } else if diff < DAY_MS {
        Some(format!("{}h ago", diff / HOUR_MS))
    } else if diff < WEEK_MS {
        Some(format!("{}d ago", diff / DAY_MS))
    } else {
        None
    }
}

/// Absolute local date, e.g. `Mar 4, 2024`
pub fn format_absolute_date(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map_or_else(String::new, |at| at.format("%b %-d, %Y").to_string())
}

/// Label shown next to a note title in the list
pub fn timestamp_label(updated_at_ms: i64, now_ms: i64) -> String {
    format_relative_time(updated_at_ms, now_ms)
        .unwrap_or_else(|| format_absolute_date(updated_at_ms))
}
