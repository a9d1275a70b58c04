//! Delivery of the digest to a Telegram chat.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TelegramConfig;
use crate::error::{DigestError, DigestResult};
use crate::feeds::NewsItem;

const API_BASE: &str = "https://api.telegram.org";
const IDEA_MAX_CHARS: usize = 2000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// The HTML message body: header, headline list, then the idea
pub fn format_message(
    items: &[NewsItem],
    idea: &str,
    generated_at: &DateTime<FixedOffset>,
) -> String {
    let mut message = String::from("<b>News idea digest</b>\n");
    let _ = writeln!(
        message,
        "<i>{}</i>\n",
        generated_at.format("%Y-%m-%d %H:%M (UTC%:z)")
    );

    message.push_str("<b>Headlines</b>\n");
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(
            message,
            "{}. [{}] {}",
            index + 1,
            escape_html(&item.source),
            escape_html(&item.title)
        );
    }

    message.push_str("\n<b>Idea</b>\n");
    let idea: String = idea.chars().take(IDEA_MAX_CHARS).collect();
    message.push_str(&escape_html(&idea));
    message
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    config: TelegramConfig,
    client: Client,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> DigestResult<Self> {
        Ok(Self {
            config,
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
        })
    }

    pub async fn send(&self, text: &str) -> DigestResult<()> {
        let payload = SendMessage {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let response = self
            .client
            .post(format!(
                "{API_BASE}/bot{}/sendMessage",
                self.config.bot_token
            ))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let result: TelegramResponse = response.json().await?;
        if !result.ok {
            return Err(DigestError::Api {
                service: "Telegram",
                message: format!(
                    "{} ({})",
                    result.description.unwrap_or_else(|| "request rejected".to_string()),
                    status.as_u16()
                ),
            });
        }
        tracing::info!("Sent digest to Telegram chat {}", self.config.chat_id);
        Ok(())
    }
}
