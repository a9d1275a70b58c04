//! Firestore REST note store.
//!
//! Writes go through the `documents` endpoints. The live query is a
//! `:runQuery` ordered by `updatedAt` descending, re-run on a fixed interval;
//! a snapshot is emitted only when the result set changed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::{Document, FieldValue, Fields, NoteStore, Snapshot, Subscription, ORDER_FIELD};
use crate::error::{Error, Result};
use crate::util::{format_api_error, is_http_url, normalize_text_option};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Connection settings for a Firestore project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,
    /// Optional bearer token for authenticated rules
    pub auth_token: Option<String>,
    /// Delay between live query refreshes
    pub poll_interval: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
            auth_token: None,
            poll_interval: Duration::from_millis(1500),
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.project_id),
            self.database
        )
    }
}

/// Note store backed by the Firestore REST API
#[derive(Clone)]
pub struct FirestoreNoteStore {
    config: FirestoreConfig,
    client: reqwest::Client,
}

impl FirestoreNoteStore {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        if normalize_text_option(Some(config.project_id.clone())).is_none() {
            return Err(Error::Config(
                "Firestore project id must not be empty".to_string(),
            ));
        }
        if !is_http_url(&config.base_url) {
            return Err(Error::Config(
                "Firestore base URL must include http:// or https://".to_string(),
            ));
        }
        if config.poll_interval.is_zero() {
            return Err(Error::Config(
                "Firestore poll interval must be greater than zero".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { config, client })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.config.api_key {
            builder = builder.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.documents_url(),
            urlencoding::encode(collection),
            urlencoding::encode(id)
        )
    }

    async fn run_query(&self, collection: &str) -> Result<Snapshot> {
        let url = format!("{}:runQuery", self.config.documents_url());
        let response = self
            .request(Method::POST, &url)
            .json(&query_body(collection))
            .send()
            .await?;
        let payload: Value = ensure_success(response).await?.json().await?;
        decode_query_response(&payload)
    }

    async fn poll(self, collection: String, mut last: Snapshot, sender: SnapshotSender) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut failing = false;
        loop {
            ticker.tick().await;
            if sender.is_closed() {
                break;
            }

            match self.run_query(&collection).await {
                Ok(snapshot) => {
                    if failing {
                        tracing::info!("Live query for '{}' recovered", collection);
                        failing = false;
                    }
                    if snapshot == last {
                        continue;
                    }
                    if sender.send(Ok(snapshot.clone())).is_err() {
                        break;
                    }
                    last = snapshot;
                }
                Err(error) => {
                    if failing {
                        tracing::debug!("Live query for '{}' still failing: {}", collection, error);
                        continue;
                    }
                    failing = true;
                    if sender.send(Err(error)).is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Live query for '{}' stopped", collection);
    }
}

type SnapshotSender = mpsc::UnboundedSender<Result<Snapshot>>;

#[async_trait]
impl NoteStore for FirestoreNoteStore {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
        let url = format!(
            "{}/{}",
            self.config.documents_url(),
            urlencoding::encode(collection)
        );
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;
        let payload: Value = ensure_success(response).await?.json().await?;

        decode_document(&payload)
            .map(|document| document.id)
            .ok_or_else(|| Error::Store("create response did not include a document name".into()))
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut query: Vec<(&str, &str)> = fields
            .keys()
            .map(|path| ("updateMask.fieldPaths", path.as_str()))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let response = self
            .request(Method::PATCH, &self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(id.to_string()));
        }
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &self.document_url(collection, id))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> Result<Subscription> {
        let initial = self.run_query(collection).await?;
        tracing::info!(
            "Live query for '{}' started with {} documents",
            collection,
            initial.len()
        );

        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(Ok(initial.clone()));
        let listener = tokio::spawn(self.clone().poll(collection.to_string(), initial, sender));
        Ok(Subscription::with_listener(receiver, listener))
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Store(parse_api_error(status, &body)))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    status: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.error)
        .and_then(|detail| detail.message.or(detail.status));
    format_api_error(status.as_u16(), message.as_deref(), body)
}

fn query_body(collection: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": ORDER_FIELD },
                "direction": "DESCENDING"
            }]
        }
    })
}

fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => json!({ "stringValue": text }),
        FieldValue::Integer(number) => json!({ "integerValue": number.to_string() }),
        FieldValue::Double(number) => json!({ "doubleValue": number }),
        FieldValue::Boolean(flag) => json!({ "booleanValue": flag }),
        FieldValue::Timestamp(at) => {
            json!({ "timestampValue": at.to_rfc3339_opts(SecondsFormat::Millis, true) })
        }
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Other(raw) => raw.clone(),
    }
}

fn decode_value(value: &Value) -> FieldValue {
    let Some(object) = value.as_object() else {
        return FieldValue::Other(value.clone());
    };

    if let Some(text) = object.get("stringValue").and_then(Value::as_str) {
        return FieldValue::Text(text.to_string());
    }
    if let Some(raw) = object.get("integerValue") {
        let parsed = raw
            .as_str()
            .and_then(|text| text.parse().ok())
            .or_else(|| raw.as_i64());
        if let Some(number) = parsed {
            return FieldValue::Integer(number);
        }
    }
    if let Some(number) = object.get("doubleValue").and_then(Value::as_f64) {
        return FieldValue::Double(number);
    }
    if let Some(flag) = object.get("booleanValue").and_then(Value::as_bool) {
        return FieldValue::Boolean(flag);
    }
    if let Some(at) = object
        .get("timestampValue")
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
    {
        return FieldValue::Timestamp(at.with_timezone(&Utc));
    }
    if object.contains_key("nullValue") {
        return FieldValue::Null;
    }
    FieldValue::Other(value.clone())
}

fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

fn decode_document(value: &Value) -> Option<Document> {
    let name = value.get("name")?.as_str()?;
    let id = name.rsplit('/').next().filter(|id| !id.is_empty())?;
    let fields = value
        .get("fields")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(name, raw)| (name.clone(), decode_value(raw)))
                .collect()
        })
        .unwrap_or_default();
    Some(Document::new(id, fields))
}

fn decode_query_response(payload: &Value) -> Result<Snapshot> {
    let entries = payload.as_array().ok_or_else(|| {
        Error::Store("runQuery response was not a JSON array".to_string())
    })?;
    Ok(entries
        .iter()
        .filter_map(|entry| entry.get("document"))
        .filter_map(decode_document)
        .collect())
}
