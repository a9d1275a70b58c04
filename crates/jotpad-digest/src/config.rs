//! Job configuration from environment variables.

use jotpad_core::util::{is_http_url, normalize_text_option};

use crate::error::{DigestError, DigestResult};

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ENV_ANTHROPIC_MAX_TOKENS: &str = "ANTHROPIC_MAX_TOKENS";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

pub const DEFAULT_MODEL: &str = "claude-opus-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Everything the job needs; sinks are optional
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestConfig {
    pub supabase: Option<SupabaseConfig>,
    pub anthropic: AnthropicConfig,
    pub telegram: Option<TelegramConfig>,
}

impl DigestConfig {
    pub fn from_env() -> DigestResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DigestResult<Self> {
        let get = |key: &str| normalize_text_option(lookup(key));

        let supabase = match (get(ENV_SUPABASE_URL), get(ENV_SUPABASE_SERVICE_ROLE_KEY)) {
            (Some(url), Some(service_role_key)) => {
                if !is_http_url(&url) {
                    return Err(DigestError::Config(format!(
                        "{ENV_SUPABASE_URL} must include http:// or https://"
                    )));
                }
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    service_role_key,
                })
            }
            (None, None) => None,
            _ => {
                tracing::warn!(
                    "Only one of {} and {} is set; Supabase is disabled",
                    ENV_SUPABASE_URL,
                    ENV_SUPABASE_SERVICE_ROLE_KEY
                );
                None
            }
        };

        let api_key = get(ENV_ANTHROPIC_API_KEY)
            .ok_or_else(|| DigestError::Config(format!("{ENV_ANTHROPIC_API_KEY} is required")))?;
        let max_tokens = match get(ENV_ANTHROPIC_MAX_TOKENS) {
            Some(raw) => raw.parse::<u32>().ok().filter(|value| *value > 0).ok_or_else(|| {
                DigestError::Config(format!(
                    "{ENV_ANTHROPIC_MAX_TOKENS} must be a positive number, got '{raw}'"
                ))
            })?,
            None => DEFAULT_MAX_TOKENS,
        };
        let anthropic = AnthropicConfig {
            api_key,
            model: get(ENV_ANTHROPIC_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
        };

        let telegram = match (get(ENV_TELEGRAM_BOT_TOKEN), get(ENV_TELEGRAM_CHAT_ID)) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        Ok(Self {
            supabase,
            anthropic,
            telegram,
        })
    }
}
