use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Feed is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{service} request failed: {message}")]
    Api {
        service: &'static str,
        message: String,
    },
    #[error("No news items could be collected")]
    NoNews,
    #[error("Model returned no text")]
    EmptyIdea,
    #[error("Neither Supabase nor Telegram accepted the digest")]
    DeliveryFailed,
}

pub type DigestResult<T> = Result<T, DigestError>;
