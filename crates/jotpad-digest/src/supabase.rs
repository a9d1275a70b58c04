//! Supabase REST (PostgREST) access for settings and generated ideas.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use jotpad_core::util::format_api_error;

use crate::config::SupabaseConfig;
use crate::error::{DigestError, DigestResult};
use crate::feeds::NewsItem;
use crate::settings::SettingsRow;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SETTINGS_TABLE: &str = "digest_settings";
const IDEAS_TABLE: &str = "news_ideas";

/// A row of `news_ideas`
#[derive(Debug, Clone, Serialize)]
pub struct IdeaRecord<'a> {
    pub generated_at: DateTime<FixedOffset>,
    pub news_items: &'a [NewsItem],
    pub idea: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeneratedAtRow {
    generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    rest_url: String,
    service_role_key: String,
    client: Client,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> DigestResult<Self> {
        Ok(Self {
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            service_role_key: config.service_role_key.clone(),
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> DigestResult<Vec<T>> {
        let request = self.authorized(
            self.client
                .get(format!("{}/{table}", self.rest_url))
                .query(query)
                .header("Accept", "application/json"),
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(response.json::<Vec<T>>().await?)
    }

    /// The settings row, if the table has one
    pub async fn fetch_settings(&self) -> DigestResult<Option<SettingsRow>> {
        let rows = self
            .select::<SettingsRow>(
                SETTINGS_TABLE,
                &[
                    (
                        "select",
                        "enabled,run_interval_minutes,active_sources,prompt_template",
                    ),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// When the newest idea was generated
    pub async fn latest_generated_at(&self) -> DigestResult<Option<DateTime<Utc>>> {
        let rows = self
            .select::<GeneratedAtRow>(
                IDEAS_TABLE,
                &[
                    ("select", "generated_at"),
                    ("order", "generated_at.desc"),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.generated_at))
    }

    pub async fn insert_idea(&self, record: &IdeaRecord<'_>) -> DigestResult<()> {
        let request = self.authorized(
            self.client
                .post(format!("{}/{IDEAS_TABLE}", self.rest_url))
                .header("Prefer", "return=minimal")
                .json(record),
        );
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        tracing::info!("Saved idea to Supabase ({})", response.status().as_u16());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn api_error(status: StatusCode, body: &str) -> DigestError {
    DigestError::Api {
        service: "Supabase",
        message: parse_api_error(status, body),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|payload| payload.message.or(payload.details).or(payload.hint));
    format_api_error(status.as_u16(), message.as_deref(), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_postgrest_error_message() {
        let body = r#"{"code":"42P01","message":"relation \"news_ideas\" does not exist","details":null,"hint":null}"#;
        assert_eq!(
            parse_api_error(StatusCode::NOT_FOUND, body),
            "relation \"news_ideas\" does not exist (404)"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }

    #[test]
    fn idea_record_serializes_to_table_columns() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let generated_at = offset.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let items = vec![NewsItem {
            source: "BBC News".to_string(),
            title: "Title".to_string(),
            summary: "Summary".to_string(),
            link: "https://news.example.com".to_string(),
        }];
        let record = IdeaRecord {
            generated_at,
            news_items: &items,
            idea: "An idea",
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["generated_at"], "2025-03-01T09:00:00+09:00");
        assert_eq!(value["news_items"][0]["source"], "BBC News");
        assert_eq!(value["idea"], "An idea");
    }

    #[test]
    fn generated_at_accepts_postgres_timestamps() {
        let row: GeneratedAtRow =
            serde_json::from_str(r#"{"generated_at":"2025-03-01T00:00:00.123456+00:00"}"#).unwrap();
        assert_eq!(row.generated_at.timestamp(), 1_740_787_200);
    }
}
