//! Remote note store boundary.
//!
//! The store is schemaless from the client's point of view: documents are
//! loose field maps keyed by a store-assigned id. [`crate::adapter`] converts
//! them to and from [`crate::Note`].

mod firestore;
mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

pub use firestore::{FirestoreConfig, FirestoreNoteStore};
pub use memory::MemoryNoteStore;

/// Field name every live query is ordered by (descending)
pub const ORDER_FIELD: &str = "updatedAt";

/// A single field value as the store reports it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    /// Store-native temporal value
    Timestamp(DateTime<Utc>),
    Null,
    /// Anything the client does not interpret (maps, arrays, references)
    Other(serde_json::Value),
}

/// Field map of one document
pub type Fields = BTreeMap<String, FieldValue>;

/// A raw document plus its store-assigned identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// One full result set of the live query, already ordered by the store
pub type Snapshot = Vec<Document>;

/// Operations the client needs from a hosted document collection.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Insert a document and return the identifier the store assigned
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Merge `fields` into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Remove a document
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Open a live query over the whole collection ordered by
    /// [`ORDER_FIELD`] descending.
    ///
    /// The first snapshot is delivered as soon as it is available; later
    /// snapshots follow every change.
    async fn subscribe(&self, collection: &str) -> Result<Subscription>;
}

/// Handle on a live query.
///
/// Dropping the handle tears the listener down.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Result<Snapshot>>,
    listener: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription fed directly by the store through `receiver`
    pub const fn new(receiver: mpsc::UnboundedReceiver<Result<Snapshot>>) -> Self {
        Self {
            receiver,
            listener: None,
        }
    }

    /// Subscription fed by a background task that is aborted on drop
    pub const fn with_listener(
        receiver: mpsc::UnboundedReceiver<Result<Snapshot>>,
        listener: JoinHandle<()>,
    ) -> Self {
        Self {
            receiver,
            listener: Some(listener),
        }
    }

    /// Wait for the next snapshot. `None` once the store closed the query.
    pub async fn next(&mut self) -> Option<Result<Snapshot>> {
        self.receiver.recv().await
    }

    /// Return a snapshot that is already queued, without waiting
    pub fn try_next(&mut self) -> Option<Result<Snapshot>> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            tracing::debug!("Tearing down live query listener");
            listener.abort();
        }
    }
}
