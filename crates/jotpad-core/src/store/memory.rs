//! In-process note store.
//!
//! Pushes a full snapshot to every live subscriber after each write, which is
//! the same contract the hosted store's live query offers. Backs the `memory`
//! store mode and serves as the fake in tests.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{Document, Fields, NoteStore, Snapshot, Subscription, ORDER_FIELD};
use crate::adapter::timestamp_millis;
use crate::error::{Error, Result};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, Fields>>,
    subscribers: Vec<(String, mpsc::UnboundedSender<Result<Snapshot>>)>,
    failure: Option<String>,
}

impl Inner {
    fn snapshot(&self, collection: &str) -> Snapshot {
        let mut docs: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        // Documents without a usable order key sort last.
        docs.sort_by_key(|doc| {
            Reverse(
                doc.fields
                    .get(ORDER_FIELD)
                    .and_then(timestamp_millis)
                    .unwrap_or(i64::MIN),
            )
        });
        docs
    }

    fn publish(&mut self, collection: &str) {
        let snapshot = self.snapshot(collection);
        self.subscribers.retain(|(subscribed, sender)| {
            if subscribed != collection {
                return !sender.is_closed();
            }
            sender.send(Ok(snapshot.clone())).is_ok()
        });
    }

    fn check_available(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(Error::Store(message.clone())),
            None => Ok(()),
        }
    }
}

/// Note store held entirely in memory
#[derive(Default)]
pub struct MemoryNoteStore {
    inner: Mutex<Inner>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put a document with a known id, as if another client had written it
    pub fn seed(&self, collection: &str, document: Document) {
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id, document.fields);
        inner.publish(collection);
    }

    /// Remove a document behind the client's back
    pub fn remove_remotely(&self, collection: &str, id: &str) {
        let mut inner = self.lock();
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        inner.publish(collection);
    }

    /// Current ordered contents of a collection
    pub fn documents(&self, collection: &str) -> Snapshot {
        self.lock().snapshot(collection)
    }

    /// Make every following write fail with `message`, or recover with `None`
    pub fn set_failure(&self, message: Option<&str>) {
        self.lock().failure = message.map(ToString::to_string);
    }

    /// Number of live subscriptions that have not been dropped
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|(_, sender)| !sender.is_closed());
        inner.subscribers.len()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
        let mut inner = self.lock();
        inner.check_available()?;

        let id = Uuid::now_v7().simple().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        inner.publish(collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut inner = self.lock();
        inner.check_available()?;

        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        existing.extend(fields);
        inner.publish(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.check_available()?;

        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        inner.publish(collection);
        Ok(())
    }

    async fn subscribe(&self, collection: &str) -> Result<Subscription> {
        let mut inner = self.lock();
        inner.check_available()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        // Receiver is alive, so the initial send cannot fail.
        let _ = sender.send(Ok(inner.snapshot(collection)));
        inner.subscribers.push((collection.to_string(), sender));
        Ok(Subscription::new(receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldValue;

    fn fields(title: &str, updated_at: i64) -> Fields {
        Fields::from([
            ("title".to_string(), FieldValue::Text(title.to_string())),
            (ORDER_FIELD.to_string(), FieldValue::Integer(updated_at)),
        ])
    }

    fn titles(snapshot: &Snapshot) -> Vec<String> {
        snapshot
            .iter()
            .map(|doc| match doc.fields.get("title") {
                Some(FieldValue::Text(title)) => title.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[tokio::test]
    async fn subscribe_delivers_current_snapshot_first() {
        let store = MemoryNoteStore::new();
        store.seed("notes", Document::new("b", fields("B", 1)));
        store.seed("notes", Document::new("a", fields("A", 2)));

        let mut subscription = store.subscribe("notes").await.unwrap();
        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(titles(&snapshot), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn writes_publish_ordered_snapshots() {
        let store = MemoryNoteStore::new();
        let mut subscription = store.subscribe("notes").await.unwrap();
        subscription.next().await.unwrap().unwrap();

        let older = store.insert("notes", fields("old", 10)).await.unwrap();
        store.insert("notes", fields("new", 20)).await.unwrap();
        subscription.next().await.unwrap().unwrap();
        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(titles(&snapshot), vec!["new", "old"]);

        store.update("notes", &older, fields("old", 30)).await.unwrap();
        let snapshot = subscription.next().await.unwrap().unwrap();
        assert_eq!(titles(&snapshot), vec!["old", "new"]);
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = MemoryNoteStore::new();
        let error = store
            .update("notes", "missing", fields("x", 1))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn failure_mode_rejects_writes() {
        let store = MemoryNoteStore::new();
        store.set_failure(Some("permission denied"));
        assert!(store.insert("notes", Fields::new()).await.is_err());
        store.set_failure(None);
        assert!(store.insert("notes", Fields::new()).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_subscriptions_are_pruned() {
        let store = MemoryNoteStore::new();
        let subscription = store.subscribe("notes").await.unwrap();
        assert_eq!(store.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(store.subscriber_count(), 0);
    }
}
