//! Client configuration.
//!
//! Read from `JOTPAD_*` environment variables. Binaries load a `.env` file
//! first, so the same keys work there.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::editor::EditPolicy;
use crate::error::{Error, Result};
use crate::store::{FirestoreConfig, FirestoreNoteStore, MemoryNoteStore, NoteStore};
use crate::util::{is_http_url, normalize_text_option};

pub const ENV_STORE: &str = "JOTPAD_STORE";
pub const ENV_FIRESTORE_PROJECT_ID: &str = "JOTPAD_FIRESTORE_PROJECT_ID";
pub const ENV_FIRESTORE_API_KEY: &str = "JOTPAD_FIRESTORE_API_KEY";
pub const ENV_FIRESTORE_AUTH_TOKEN: &str = "JOTPAD_FIRESTORE_AUTH_TOKEN";
pub const ENV_FIRESTORE_BASE_URL: &str = "JOTPAD_FIRESTORE_BASE_URL";
pub const ENV_COLLECTION: &str = "JOTPAD_COLLECTION";
pub const ENV_POLL_INTERVAL_MS: &str = "JOTPAD_POLL_INTERVAL_MS";
pub const ENV_EDIT_POLICY: &str = "JOTPAD_EDIT_POLICY";
pub const ENV_MARKDOWN_PREVIEW: &str = "JOTPAD_MARKDOWN_PREVIEW";
pub const ENV_THEME: &str = "JOTPAD_THEME";

pub const DEFAULT_COLLECTION: &str = "notes";
const MIN_POLL_INTERVAL_MS: u64 = 250;

/// Theme mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow system preference
    #[default]
    System,
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!(
                "unknown theme '{other}' (expected light, dark, or system)"
            )),
        }
    }
}

/// Which note store backs the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In-process store; nothing survives a restart
    Memory,
    Firestore(FirestoreConfig),
}

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub store: StoreConfig,
    pub collection: String,
    pub edit_policy: EditPolicy,
    pub markdown_preview: bool,
    pub theme: ThemeMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::Memory,
            collection: DEFAULT_COLLECTION.to_string(),
            edit_policy: EditPolicy::default(),
            markdown_preview: true,
            theme: ThemeMode::default(),
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a key to its raw value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| normalize_text_option(lookup(key));

        let project_id = get(ENV_FIRESTORE_PROJECT_ID);
        let store_kind = get(ENV_STORE).map(|kind| kind.to_ascii_lowercase());
        let use_firestore = match store_kind.as_deref() {
            Some("memory") => false,
            Some("firestore") => true,
            Some(other) => {
                return Err(Error::Config(format!(
                    "{ENV_STORE} must be 'memory' or 'firestore', got '{other}'"
                )))
            }
            None => project_id.is_some(),
        };

        let store = if use_firestore {
            let project_id = project_id.ok_or_else(|| {
                Error::Config(format!(
                    "{ENV_FIRESTORE_PROJECT_ID} is required for the firestore store"
                ))
            })?;
            let mut firestore = FirestoreConfig::new(project_id);
            if let Some(base_url) = get(ENV_FIRESTORE_BASE_URL) {
                if !is_http_url(&base_url) {
                    return Err(Error::Config(format!(
                        "{ENV_FIRESTORE_BASE_URL} must include http:// or https://"
                    )));
                }
                firestore.base_url = base_url.trim_end_matches('/').to_string();
            }
            firestore.api_key = get(ENV_FIRESTORE_API_KEY);
            firestore.auth_token = get(ENV_FIRESTORE_AUTH_TOKEN);
            if let Some(raw) = get(ENV_POLL_INTERVAL_MS) {
                let millis: u64 = raw.parse().map_err(|_| {
                    Error::Config(format!("{ENV_POLL_INTERVAL_MS} must be a number, got '{raw}'"))
                })?;
                firestore.poll_interval = Duration::from_millis(millis.max(MIN_POLL_INTERVAL_MS));
            }
            StoreConfig::Firestore(firestore)
        } else {
            StoreConfig::Memory
        };

        let edit_policy = match get(ENV_EDIT_POLICY) {
            Some(raw) => raw.parse().map_err(Error::Config)?,
            None => EditPolicy::default(),
        };

        let markdown_preview = match get(ENV_MARKDOWN_PREVIEW) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                Error::Config(format!("{ENV_MARKDOWN_PREVIEW} must be true or false, got '{raw}'"))
            })?,
            None => true,
        };

        let theme = match get(ENV_THEME) {
            Some(raw) => raw.parse().map_err(Error::Config)?,
            None => ThemeMode::default(),
        };

        Ok(Self {
            store,
            collection: get(ENV_COLLECTION).unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            edit_policy,
            markdown_preview,
            theme,
        })
    }

    /// Construct the configured store
    pub fn build_store(&self) -> Result<Arc<dyn NoteStore>> {
        match &self.store {
            StoreConfig::Memory => {
                tracing::info!("Using in-memory note store (notes are not persisted)");
                Ok(Arc::new(MemoryNoteStore::new()))
            }
            StoreConfig::Firestore(config) => {
                tracing::info!(
                    "Using Firestore project '{}' (poll every {:?})",
                    config.project_id,
                    config.poll_interval
                );
                Ok(Arc::new(FirestoreNoteStore::new(config.clone())?))
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
