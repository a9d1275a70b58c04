//! Idea generation through the Anthropic Messages API.

use std::fmt::Write as _;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use jotpad_core::util::format_api_error;

use crate::config::AnthropicConfig;
use crate::error::{DigestError, DigestResult};
use crate::feeds::NewsItem;
use crate::settings::NEWS_PLACEHOLDER;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// The numbered news block inserted into the prompt
pub fn format_news_block(items: &[NewsItem]) -> String {
    let mut block = String::new();
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            block.push_str("\n\n");
        }
        let _ = write!(
            block,
            "**News {} ({})**\nTitle: {}\nSummary: {}",
            index + 1,
            item.source,
            item.title,
            item.summary
        );
    }
    block
}

/// Fill the template's `{news}` placeholder; a template without one gets the
/// news appended
pub fn render_prompt(template: &str, items: &[NewsItem]) -> String {
    let news = format_news_block(items);
    if template.contains(NEWS_PLACEHOLDER) {
        template.replace(NEWS_PLACEHOLDER, &news)
    } else {
        tracing::warn!("Prompt template has no {} placeholder; appending news", NEWS_PLACEHOLDER);
        format!("{}\n\n{news}", template.trim_end())
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text blocks of a Messages API response body
fn response_text(body: &str) -> DigestResult<String> {
    let response: MessagesResponse = serde_json::from_str(body)?;
    let text = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<String>();
    if text.trim().is_empty() {
        return Err(DigestError::EmptyIdea);
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.error)
        .and_then(|detail| detail.message);
    format_api_error(status.as_u16(), message.as_deref(), body)
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> DigestResult<Self> {
        Ok(Self {
            config,
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
        })
    }

    pub async fn generate(&self, prompt: &str) -> DigestResult<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!("Requesting idea from model '{}'", self.config.model);
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DigestError::Api {
                service: "Anthropic",
                message: parse_api_error(status, &body),
            });
        }
        response_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items() -> Vec<NewsItem> {
        vec![
            NewsItem {
                source: "BBC News".to_string(),
                title: "Rain returns".to_string(),
                summary: "Forecast shows rain.".to_string(),
                link: String::new(),
            },
            NewsItem {
                source: "AP News".to_string(),
                title: "Chips shortage".to_string(),
                summary: "Supply is tight.".to_string(),
                link: String::new(),
            },
        ]
    }

    #[test]
    fn news_block_numbers_items() {
        assert_eq!(
            format_news_block(&items()),
            "**News 1 (BBC News)**\nTitle: Rain returns\nSummary: Forecast shows rain.\n\n\
             **News 2 (AP News)**\nTitle: Chips shortage\nSummary: Supply is tight."
        );
    }

    #[test]
    fn prompt_replaces_placeholder() {
        let prompt = render_prompt("Before\n{news}\nAfter", &items());
        assert!(prompt.starts_with("Before\n**News 1"));
        assert!(prompt.ends_with("Supply is tight.\nAfter"));
    }

    #[test]
    fn prompt_without_placeholder_appends_news() {
        let prompt = render_prompt("Give me an idea.\n", &items());
        assert!(prompt.starts_with("Give me an idea.\n\n**News 1"));
    }

    #[test]
    fn request_matches_messages_api_shape() {
        let request = MessagesRequest {
            model: "model",
            max_tokens: 64,
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "model",
                "max_tokens": 64,
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn extracts_text_blocks() {
        let body = r###"{"id":"msg_1","content":[{"type":"text","text":"## Idea"},{"type":"text","text":"\nMore"}]}"###;
        assert_eq!(response_text(body).unwrap(), "## Idea\nMore");
        assert!(matches!(
            response_text(r#"{"content":[]}"#),
            Err(DigestError::EmptyIdea)
        ));
    }

    #[test]
    fn parses_error_body() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(
            parse_api_error(StatusCode::from_u16(529).unwrap(), body),
            "Overloaded (529)"
        );
    }
}
