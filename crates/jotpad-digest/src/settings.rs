//! Run settings stored next to the generated ideas.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::feeds::BUILTIN_FEEDS;

pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

/// Scheduler jitter allowed when deciding whether a run is due
const DUE_TOLERANCE_SECS: i64 = 120;

/// Placeholder replaced with the collected news
pub const NEWS_PLACEHOLDER: &str = "{news}";

pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a creative strategist.
Read today's top news stories below, find the thread that connects them, and combine them into one new, concrete idea.

{news}

Answer in this format:

## Idea name
(short and memorable)

## Key insight
(the shared trend or opportunity the stories point to)

## The idea
(a specific product, service, policy, or campaign)

## How to make it happen
(three concrete steps)

## Expected impact
(what changes and who benefits)
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSettings {
    pub enabled: bool,
    pub run_interval_minutes: u32,
    /// Keys of [`BUILTIN_FEEDS`] to read from
    pub active_sources: Vec<String>,
    pub prompt_template: String,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            run_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            active_sources: BUILTIN_FEEDS.iter().map(|feed| feed.key.to_string()).collect(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// A `digest_settings` row; every column may be null
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRow {
    pub enabled: Option<bool>,
    pub run_interval_minutes: Option<i64>,
    pub active_sources: Option<Vec<String>>,
    pub prompt_template: Option<String>,
}

impl From<SettingsRow> for DigestSettings {
    fn from(row: SettingsRow) -> Self {
        let defaults = Self::default();
        Self {
            enabled: row.enabled.unwrap_or(defaults.enabled),
            run_interval_minutes: row
                .run_interval_minutes
                .and_then(|minutes| u32::try_from(minutes).ok())
                .filter(|minutes| *minutes > 0)
                .unwrap_or(defaults.run_interval_minutes),
            active_sources: row.active_sources.unwrap_or(defaults.active_sources),
            prompt_template: row
                .prompt_template
                .filter(|template| !template.trim().is_empty())
                .unwrap_or(defaults.prompt_template),
        }
    }
}

/// Whether enough time has passed since `last_run`
pub fn is_due(last_run: Option<DateTime<Utc>>, interval_minutes: u32, now: DateTime<Utc>) -> bool {
    let Some(last_run) = last_run else {
        return true;
    };
    let interval = Duration::minutes(i64::from(interval_minutes));
    now - last_run + Duration::seconds(DUE_TOLERANCE_SECS) >= interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn empty_row_uses_defaults() {
        let settings = DigestSettings::from(SettingsRow::default());
        assert_eq!(settings, DigestSettings::default());
        assert_eq!(settings.active_sources, vec!["bbc", "reuters", "ap"]);
        assert!(settings.prompt_template.contains(NEWS_PLACEHOLDER));
    }

    #[test]
    fn row_values_override_defaults() {
        let row: SettingsRow = serde_json::from_str(
            r#"{"enabled": false, "run_interval_minutes": 180, "active_sources": ["ap"], "prompt_template": "Ideas from {news}"}"#,
        )
        .unwrap();
        let settings = DigestSettings::from(row);
        assert!(!settings.enabled);
        assert_eq!(settings.run_interval_minutes, 180);
        assert_eq!(settings.active_sources, vec!["ap"]);
        assert_eq!(settings.prompt_template, "Ideas from {news}");
    }

    #[test]
    fn invalid_interval_and_blank_template_fall_back() {
        let row: SettingsRow = serde_json::from_str(
            r#"{"run_interval_minutes": 0, "prompt_template": "  ", "active_sources": null}"#,
        )
        .unwrap();
        let settings = DigestSettings::from(row);
        assert_eq!(settings.run_interval_minutes, DEFAULT_INTERVAL_MINUTES);
        assert_eq!(settings.prompt_template, DEFAULT_PROMPT_TEMPLATE);
        assert_eq!(settings.active_sources.len(), 3);
    }

    #[test]
    fn due_when_never_run_or_interval_elapsed() {
        assert!(is_due(None, 60, at(10, 0)));
        assert!(is_due(Some(at(9, 0)), 60, at(10, 0)));
        assert!(!is_due(Some(at(9, 30)), 60, at(10, 0)));
    }

    #[test]
    fn due_tolerates_scheduler_jitter() {
        let last = at(9, 0) + Duration::seconds(45);
        assert!(is_due(Some(last), 60, at(10, 0)));
        assert!(!is_due(Some(at(9, 5)), 60, at(10, 0)));
    }
}
