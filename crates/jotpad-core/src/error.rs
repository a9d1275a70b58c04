//! Error types for jotpad-core

use thiserror::Error;

/// Result type alias using jotpad-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jotpad-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote store rejected or failed an operation
    #[error("Store error: {0}")]
    Store(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The live query ended before a snapshot arrived
    #[error("Subscription closed")]
    SubscriptionClosed,
}
