//! Client state: the note list, the selection, and the actions on them.
//!
//! The list is authoritative-from-subscription. Local changes are held as
//! provisional overlays until a snapshot catches up with them:
//!
//! - a provisional edit survives a snapshot only while its `updated_at` is
//!   strictly newer than the snapshot's copy (last writer wins, ties go to
//!   the store);
//! - a provisional note that has already appeared in a snapshot is dropped
//!   when a later snapshot no longer contains it;
//! - a note being created is shown under a `local-` placeholder id until the
//!   store assigns the real one.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::adapter::{fields_for_create, fields_for_update, note_from_document};
use crate::error::{Error, Result};
use crate::models::{Note, NoteEdit, NoteId};
use crate::store::{NoteStore, Snapshot, Subscription};
use crate::util::now_ms;

/// Placeholder ids remembered after their create completes. A placeholder
/// only outlives its create inside an editor draft, so a short history is
/// enough.
const MAX_RESOLVED_IDS: usize = 32;

/// What the views render: the ordered list and the selected note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesView {
    /// Notes ordered by `updated_at` descending
    pub notes: Vec<Note>,
    /// The selected note, if any
    pub selected: Option<Note>,
}

impl NotesView {
    pub fn selected_id(&self) -> Option<&NoteId> {
        self.selected.as_ref().map(|note| &note.id)
    }
}

#[derive(Debug, Clone)]
struct Provisional {
    note: Note,
    /// Created locally and not yet seen in any snapshot
    awaiting_first_snapshot: bool,
    /// Bumped on every local write, so a failed write only rolls back itself
    generation: u64,
}

#[derive(Debug, Clone)]
struct PendingCreate {
    note: Note,
    /// Edited while the insert was in flight
    dirty: bool,
}

#[derive(Debug, Default)]
struct NotesState {
    /// Last snapshot, in store order
    snapshot: Vec<Note>,
    provisional: HashMap<NoteId, Provisional>,
    pending_creates: HashMap<NoteId, PendingCreate>,
    /// Placeholder id -> store-assigned id, for edits that race the rekey
    resolved_ids: HashMap<NoteId, NoteId>,
    /// Insertion order of `resolved_ids`, oldest first
    resolved_order: VecDeque<NoteId>,
    selected: Option<NoteId>,
    generation: u64,
}

impl NotesState {
    fn resolve<'a>(&'a self, id: &'a NoteId) -> &'a NoteId {
        self.resolved_ids.get(id).unwrap_or(id)
    }

    fn remember_resolved(&mut self, local: NoteId, remote: NoteId) {
        if self.resolved_order.len() == MAX_RESOLVED_IDS {
            if let Some(oldest) = self.resolved_order.pop_front() {
                self.resolved_ids.remove(&oldest);
            }
        }
        self.resolved_order.push_back(local.clone());
        self.resolved_ids.insert(local, remote);
    }

    fn current(&self, id: &NoteId) -> Option<Note> {
        if let Some(pending) = self.pending_creates.get(id) {
            return Some(pending.note.clone());
        }
        if let Some(provisional) = self.provisional.get(id) {
            return Some(provisional.note.clone());
        }
        self.snapshot.iter().find(|note| &note.id == id).cloned()
    }

    fn apply_snapshot(&mut self, snapshot: Vec<Note>) {
        self.provisional.retain(|id, provisional| {
            match snapshot.iter().find(|note| &note.id == id) {
                Some(remote) => {
                    provisional.awaiting_first_snapshot = false;
                    provisional.note.updated_at > remote.updated_at
                }
                None => provisional.awaiting_first_snapshot,
            }
        });
        self.snapshot = snapshot;

        let Some(selected) = self.selected.clone() else {
            return;
        };
        let still_present = selected.is_local()
            || self.provisional.contains_key(&selected)
            || self.snapshot.iter().any(|note| note.id == selected);
        if !still_present {
            tracing::info!("Selected note {} vanished from the store", selected);
            self.selected = None;
        }
    }

    fn view(&self) -> NotesView {
        let mut notes: Vec<Note> = self
            .snapshot
            .iter()
            .map(|note| {
                self.provisional
                    .get(&note.id)
                    .map_or_else(|| note.clone(), |provisional| provisional.note.clone())
            })
            .collect();

        for (id, provisional) in &self.provisional {
            if !self.snapshot.iter().any(|note| &note.id == id) {
                notes.push(provisional.note.clone());
            }
        }
        notes.extend(self.pending_creates.values().map(|pending| pending.note.clone()));

        // Stable, so notes with equal timestamps keep the store's order.
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let selected = self
            .selected
            .as_ref()
            .and_then(|id| notes.iter().find(|note| &note.id == id).cloned());
        NotesView { notes, selected }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

/// Owns the client-side note state and talks to the store.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct NoteController {
    store: Arc<dyn NoteStore>,
    collection: Arc<str>,
    state: Arc<Mutex<NotesState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl NoteController {
    pub fn new(store: Arc<dyn NoteStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: Arc::from(collection.into()),
            state: Arc::default(),
            revision: Arc::new(watch::channel(0).0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NotesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Receiver that changes whenever [`Self::view`] may have changed
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Snapshot of what the views should render
    pub fn view(&self) -> NotesView {
        self.lock().view()
    }

    /// Currently selected note id
    pub fn selected_id(&self) -> Option<NoteId> {
        self.lock().selected.clone()
    }

    /// Store-assigned id for a placeholder whose create has completed,
    /// otherwise `id` itself
    pub fn resolve_id(&self, id: &NoteId) -> NoteId {
        self.lock().resolve(id).clone()
    }

    /// Open the live query over the note collection
    pub async fn subscribe(&self) -> Result<Subscription> {
        tracing::debug!("Subscribing to collection '{}'", self.collection);
        self.store.subscribe(&self.collection).await
    }

    /// Replace the list with a fresh snapshot from the store
    pub fn apply_snapshot(&self, snapshot: &Snapshot) {
        let now = now_ms();
        let notes = snapshot
            .iter()
            .map(|document| note_from_document(document, now))
            .collect();
        self.lock().apply_snapshot(notes);
        self.notify();
        tracing::debug!("Applied snapshot with {} notes", snapshot.len());
    }

    /// Apply one item from a subscription. Errors are logged, not returned.
    pub fn handle(&self, batch: Result<Snapshot>) {
        match batch {
            Ok(snapshot) => self.apply_snapshot(&snapshot),
            Err(error) => tracing::warn!("Live query error: {}", error),
        }
    }

    /// Drive `subscription` until the store closes it
    pub async fn run(&self, mut subscription: Subscription) {
        while let Some(batch) = subscription.next().await {
            self.handle(batch);
        }
        tracing::info!("Live query for '{}' closed", self.collection);
    }

    /// Change the selection
    pub fn select(&self, id: Option<NoteId>) {
        let mut state = self.lock();
        let resolved = id.map(|id| state.resolve(&id).clone());
        state.selected = resolved;
        drop(state);
        self.notify();
    }

    /// Create an empty note, select it, and return its store-assigned id.
    ///
    /// The note is selected under a placeholder id before the store answers.
    pub async fn create(&self) -> Result<NoteId> {
        let now = now_ms();
        let placeholder = Note::empty(NoteId::local(), now);
        let local_id = placeholder.id.clone();
        {
            let mut state = self.lock();
            state.pending_creates.insert(
                local_id.clone(),
                PendingCreate {
                    note: placeholder,
                    dirty: false,
                },
            );
            state.selected = Some(local_id.clone());
        }
        self.notify();

        let inserted = self
            .store
            .insert(&self.collection, fields_for_create(now))
            .await;

        let remote_id = match inserted {
            Ok(id) => NoteId::new(id),
            Err(error) => {
                tracing::error!("Failed to create note: {}", error);
                let mut state = self.lock();
                state.pending_creates.remove(&local_id);
                if state.selected.as_ref() == Some(&local_id) {
                    state.selected = None;
                }
                drop(state);
                self.notify();
                return Err(error);
            }
        };
        tracing::debug!("Created note {} (placeholder {})", remote_id, local_id);

        let (flush, abandoned) = {
            let mut state = self.lock();
            let pending = state.pending_creates.remove(&local_id);
            state.remember_resolved(local_id.clone(), remote_id.clone());
            if state.selected.as_ref() == Some(&local_id) {
                state.selected = Some(remote_id.clone());
            }

            match pending {
                Some(pending) => {
                    let mut note = pending.note;
                    note.id = remote_id.clone();
                    let seen = state.snapshot.iter().any(|known| known.id == remote_id);
                    let generation = state.next_generation();
                    let flush = pending.dirty.then(|| NoteEdit {
                        id: remote_id.clone(),
                        title: Some(note.title.clone()),
                        content: Some(note.content.clone()),
                    });
                    let updated_at = note.updated_at;
                    state.provisional.insert(
                        remote_id.clone(),
                        Provisional {
                            note,
                            awaiting_first_snapshot: !seen,
                            generation,
                        },
                    );
                    (flush.map(|edit| (edit, updated_at, generation)), false)
                }
                None => (None, true),
            }
        };
        self.notify();

        if abandoned {
            tracing::debug!("Note {} was deleted before its create finished", remote_id);
            self.store.delete(&self.collection, remote_id.as_str()).await?;
            return Ok(remote_id);
        }

        if let Some((edit, updated_at, generation)) = flush {
            let written = self
                .store
                .update(
                    &self.collection,
                    remote_id.as_str(),
                    fields_for_update(&edit, updated_at),
                )
                .await;
            if let Err(error) = written {
                tracing::error!("Failed to save new note {}: {}", remote_id, error);
                let mut state = self.lock();
                if state
                    .provisional
                    .get(&remote_id)
                    .is_some_and(|provisional| provisional.generation == generation)
                {
                    state.provisional.remove(&remote_id);
                }
                drop(state);
                self.notify();
                return Err(error);
            }
        }

        Ok(remote_id)
    }

    /// Apply an edit locally right away, then write it to the store.
    ///
    /// Returns the note as it now appears locally. On failure the local
    /// change is rolled back to whatever the store last reported.
    pub async fn update(&self, edit: NoteEdit) -> Result<Note> {
        if edit.is_empty() {
            let state = self.lock();
            let id = state.resolve(&edit.id);
            return state
                .current(id)
                .ok_or_else(|| Error::NotFound(id.to_string()));
        }

        let now = now_ms();
        let (edit, note, generation) = {
            let mut state = self.lock();
            let id = state.resolve(&edit.id).clone();
            let edit = NoteEdit { id, ..edit };

            if let Some(pending) = state.pending_creates.get_mut(&edit.id) {
                pending.note.apply(&edit, now);
                pending.dirty = true;
                let note = pending.note.clone();
                drop(state);
                self.notify();
                return Ok(note);
            }

            let mut note = state
                .current(&edit.id)
                .ok_or_else(|| Error::NotFound(edit.id.to_string()))?;
            note.apply(&edit, now);

            let generation = state.next_generation();
            let awaiting_first_snapshot = state
                .provisional
                .get(&edit.id)
                .is_some_and(|provisional| provisional.awaiting_first_snapshot);
            state.provisional.insert(
                edit.id.clone(),
                Provisional {
                    note: note.clone(),
                    awaiting_first_snapshot,
                    generation,
                },
            );
            (edit, note, generation)
        };
        self.notify();

        let written = self
            .store
            .update(
                &self.collection,
                edit.id.as_str(),
                fields_for_update(&edit, note.updated_at),
            )
            .await;

        if let Err(error) = written {
            tracing::error!("Failed to save note {}: {}", edit.id, error);
            let mut state = self.lock();
            if state
                .provisional
                .get(&edit.id)
                .is_some_and(|provisional| provisional.generation == generation)
            {
                state.provisional.remove(&edit.id);
            }
            drop(state);
            self.notify();
            return Err(error);
        }

        Ok(note)
    }

    /// Delete a note; clears the selection if it was the deleted note
    pub async fn delete(&self, id: &NoteId) -> Result<()> {
        let id = {
            let mut state = self.lock();
            let id = state.resolve(id).clone();
            if state.pending_creates.remove(&id).is_some() {
                // The insert is still in flight; `create` removes the
                // document once it learns the real id.
                if state.selected.as_ref() == Some(&id) {
                    state.selected = None;
                }
                drop(state);
                self.notify();
                return Ok(());
            }
            id
        };

        self.store.delete(&self.collection, id.as_str()).await?;
        tracing::debug!("Deleted note {}", id);

        {
            let mut state = self.lock();
            state.provisional.remove(&id);
            if state.selected.as_ref() == Some(&id) {
                state.selected = None;
            }
        }
        self.notify();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{FIELD_CONTENT, FIELD_CREATED_AT, FIELD_TITLE, FIELD_UPDATED_AT};
    use crate::store::{Document, FieldValue, Fields, MemoryNoteStore};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Semaphore;

    const COLLECTION: &str = "notes";

    fn at(hour: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn document(id: &str, title: &str, created_at: i64, updated_at: i64) -> Document {
        Document::new(
            id,
            Fields::from([
                (FIELD_TITLE.to_string(), FieldValue::Text(title.to_string())),
                (FIELD_CONTENT.to_string(), FieldValue::Text(String::new())),
                (FIELD_CREATED_AT.to_string(), FieldValue::Integer(created_at)),
                (FIELD_UPDATED_AT.to_string(), FieldValue::Integer(updated_at)),
            ]),
        )
    }

    async fn setup() -> (Arc<MemoryNoteStore>, NoteController, Subscription) {
        let store = Arc::new(MemoryNoteStore::new());
        store.seed(COLLECTION, document("a", "A", at(8), at(10)));
        store.seed(COLLECTION, document("b", "B", at(8), at(9)));
        let controller = NoteController::new(store.clone(), COLLECTION);
        let mut subscription = controller.subscribe().await.unwrap();
        pump(&controller, &mut subscription);
        (store, controller, subscription)
    }

    /// Apply every snapshot the store has already queued
    fn pump(controller: &NoteController, subscription: &mut Subscription) {
        while let Some(batch) = subscription.try_next() {
            controller.handle(batch);
        }
    }

    fn titles(view: &NotesView) -> Vec<String> {
        view.notes.iter().map(|note| note.title.clone()).collect()
    }

    fn assert_invariants(view: &NotesView) {
        for note in &view.notes {
            assert!(note.updated_at >= note.created_at, "{note:?}");
        }
        for pair in view.notes.windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }
    }

    #[tokio::test]
    async fn renders_store_order() {
        let (_store, controller, _subscription) = setup().await;
        let view = controller.view();
        assert_eq!(titles(&view), vec!["A", "B"]);
        assert_invariants(&view);
    }

    #[tokio::test]
    async fn create_selects_new_note_and_lists_it_first() {
        let (_store, controller, mut subscription) = setup().await;
        controller.select(Some(NoteId::new("b")));

        let id = controller.create().await.unwrap();
        assert!(!id.is_local());

        let view = controller.view();
        let selected = view.selected.clone().unwrap();
        assert_eq!(selected.id, id);
        assert_eq!(selected.title, "");
        assert_eq!(selected.content, "");

        pump(&controller, &mut subscription);
        let view = controller.view();
        assert_eq!(view.notes.len(), 3);
        assert_eq!(view.notes[0].id, id);
        assert_eq!(titles(&view)[1..].to_vec(), vec!["A", "B"]);
        assert_eq!(view.selected_id(), Some(&id));
        assert_invariants(&view);
    }

    #[tokio::test]
    async fn resolve_id_passes_through_unknown_ids() {
        let (_store, controller, _subscription) = setup().await;
        assert_eq!(controller.resolve_id(&NoteId::new("a")), NoteId::new("a"));
        let local = NoteId::local();
        assert_eq!(controller.resolve_id(&local), local);
    }

    #[tokio::test]
    async fn create_failure_drops_placeholder() {
        let (store, controller, _subscription) = setup().await;
        store.set_failure(Some("quota exceeded"));

        assert!(controller.create().await.is_err());
        let view = controller.view();
        assert_eq!(view.notes.len(), 2);
        assert!(view.selected.is_none());
    }

    #[tokio::test]
    async fn update_is_visible_before_snapshot_and_refreshes_updated_at() {
        let (_store, controller, mut subscription) = setup().await;
        let id = NoteId::new("b");
        controller.select(Some(id.clone()));

        let before = now_ms();
        let note = controller
            .update(NoteEdit::content(id.clone(), "fresh"))
            .await
            .unwrap();
        assert_eq!(note.content, "fresh");
        assert!(note.updated_at >= before);
        assert_eq!(note.created_at, at(8));

        // Local view reflects the edit without waiting for the round trip.
        let view = controller.view();
        assert_eq!(view.selected.as_ref().unwrap().content, "fresh");
        assert_eq!(view.notes[0].id, id);

        pump(&controller, &mut subscription);
        let view = controller.view();
        assert_eq!(view.selected.as_ref().unwrap().content, "fresh");
        assert_eq!(view.notes[0].created_at, at(8));
        assert_invariants(&view);
    }

    #[tokio::test]
    async fn stale_snapshot_does_not_overwrite_newer_local_edit() {
        let (_store, controller, _subscription) = setup().await;
        let id = NoteId::new("a");
        controller
            .update(NoteEdit::title(id.clone(), "Local"))
            .await
            .unwrap();

        // A snapshot that predates the write arrives late.
        controller.apply_snapshot(&vec![
            document("a", "A", at(8), at(10)),
            document("b", "B", at(8), at(9)),
        ]);
        let view = controller.view();
        assert_eq!(view.notes[0].title, "Local");
    }

    #[tokio::test]
    async fn newer_remote_write_wins_over_local_edit() {
        let (_store, controller, _subscription) = setup().await;
        let id = NoteId::new("a");
        let local = controller
            .update(NoteEdit::title(id.clone(), "Local"))
            .await
            .unwrap();

        controller.apply_snapshot(&vec![document(
            "a",
            "Remote",
            at(8),
            local.updated_at + 1,
        )]);
        assert_eq!(controller.view().notes[0].title, "Remote");
    }

    #[tokio::test]
    async fn failed_update_rolls_back_to_store_state() {
        let (store, controller, _subscription) = setup().await;
        store.set_failure(Some("offline"));

        let result = controller
            .update(NoteEdit::title(NoteId::new("b"), "Lost"))
            .await;
        assert!(result.is_err());
        assert_eq!(titles(&controller.view()), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn update_of_unknown_note_is_not_found() {
        let (_store, controller, _subscription) = setup().await;
        let error = controller
            .update(NoteEdit::title(NoteId::new("zzz"), "x"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_selected_note_clears_selection() {
        let (_store, controller, mut subscription) = setup().await;
        let id = NoteId::new("a");
        controller.select(Some(id.clone()));

        controller.delete(&id).await.unwrap();
        assert!(controller.view().selected.is_none());

        pump(&controller, &mut subscription);
        assert_eq!(titles(&controller.view()), vec!["B"]);
    }

    #[tokio::test]
    async fn deleting_other_note_keeps_selection() {
        let (_store, controller, mut subscription) = setup().await;
        controller.select(Some(NoteId::new("a")));

        controller.delete(&NoteId::new("b")).await.unwrap();
        pump(&controller, &mut subscription);
        assert_eq!(controller.selected_id(), Some(NoteId::new("a")));
    }

    #[tokio::test]
    async fn remote_delete_of_selected_note_clears_selection() {
        let (store, controller, mut subscription) = setup().await;
        controller.select(Some(NoteId::new("a")));

        store.remove_remotely(COLLECTION, "a");
        pump(&controller, &mut subscription);

        let view = controller.view();
        assert_eq!(titles(&view), vec!["B"]);
        assert!(view.selected.is_none());
    }

    /// Holds every insert until [`GatedStore::release_insert`] is called
    struct GatedStore {
        inner: MemoryNoteStore,
        inserts: Semaphore,
        fail_updates: AtomicBool,
    }

    impl GatedStore {
        fn new() -> Self {
            Self {
                inner: MemoryNoteStore::new(),
                inserts: Semaphore::new(0),
                fail_updates: AtomicBool::new(false),
            }
        }

        fn release_insert(&self) {
            self.inserts.add_permits(1);
        }
    }

    #[async_trait]
    impl NoteStore for GatedStore {
        async fn insert(&self, collection: &str, fields: Fields) -> Result<String> {
            self.inserts
                .acquire()
                .await
                .map_err(|error| Error::Store(error.to_string()))?
                .forget();
            self.inner.insert(collection, fields).await
        }

        async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(Error::Store("offline".to_string()));
            }
            self.inner.update(collection, id, fields).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.inner.delete(collection, id).await
        }

        async fn subscribe(&self, collection: &str) -> Result<Subscription> {
            self.inner.subscribe(collection).await
        }
    }

    /// Start a create whose insert waits on the gate, and return the task
    /// with the placeholder id once it is selected
    async fn start_gated_create(
        controller: &NoteController,
    ) -> (tokio::task::JoinHandle<Result<NoteId>>, NoteId) {
        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.create().await }
        });
        loop {
            if let Some(id) = controller.selected_id().filter(NoteId::is_local) {
                return (task, id);
            }
            tokio::task::yield_now().await;
        }
    }

    fn stored_titles(store: &GatedStore) -> Vec<FieldValue> {
        store
            .inner
            .documents(COLLECTION)
            .into_iter()
            .filter_map(|document| document.fields.get(FIELD_TITLE).cloned())
            .collect()
    }

    #[tokio::test]
    async fn edits_during_create_are_written_after_insert() {
        let store = Arc::new(GatedStore::new());
        let controller = NoteController::new(store.clone(), COLLECTION);
        let mut subscription = controller.subscribe().await.unwrap();

        let (task, local_id) = start_gated_create(&controller).await;
        controller
            .update(NoteEdit::title(local_id.clone(), "Draft"))
            .await
            .unwrap();
        assert_eq!(controller.view().selected.unwrap().title, "Draft");
        assert!(store.inner.documents(COLLECTION).is_empty());

        store.release_insert();
        let id = task.await.unwrap().unwrap();
        assert_eq!(
            stored_titles(&store),
            vec![FieldValue::Text("Draft".to_string())]
        );

        pump(&controller, &mut subscription);
        let view = controller.view();
        assert_eq!(view.selected_id(), Some(&id));
        assert_eq!(titles(&view), vec!["Draft"]);
    }

    #[tokio::test]
    async fn delete_during_create_removes_the_inserted_note() {
        let store = Arc::new(GatedStore::new());
        let controller = NoteController::new(store.clone(), COLLECTION);
        let mut subscription = controller.subscribe().await.unwrap();

        let (task, local_id) = start_gated_create(&controller).await;
        controller.delete(&local_id).await.unwrap();
        assert_eq!(controller.selected_id(), None);
        assert!(controller.view().notes.is_empty());

        store.release_insert();
        task.await.unwrap().unwrap();
        assert!(store.inner.documents(COLLECTION).is_empty());

        pump(&controller, &mut subscription);
        let view = controller.view();
        assert!(view.notes.is_empty());
        assert_eq!(view.selected_id(), None);
    }

    #[tokio::test]
    async fn failed_write_of_edits_made_during_create_is_rolled_back() {
        let store = Arc::new(GatedStore::new());
        store.fail_updates.store(true, Ordering::SeqCst);
        let controller = NoteController::new(store.clone(), COLLECTION);
        let mut subscription = controller.subscribe().await.unwrap();

        let (task, local_id) = start_gated_create(&controller).await;
        controller
            .update(NoteEdit::title(local_id, "Draft"))
            .await
            .unwrap();

        store.release_insert();
        assert!(task.await.unwrap().is_err());
        assert_eq!(stored_titles(&store), vec![FieldValue::Text(String::new())]);

        pump(&controller, &mut subscription);
        let view = controller.view();
        assert_eq!(titles(&view), vec![""]);
        assert!(!titles(&view).contains(&"Draft".to_string()));
    }

    #[test]
    fn resolved_ids_keep_a_bounded_history() {
        let mut state = NotesState::default();
        let first = NoteId::local();
        state.remember_resolved(first.clone(), NoteId::new("remote-0"));
        assert_eq!(state.resolve(&first), &NoteId::new("remote-0"));

        for index in 1..=MAX_RESOLVED_IDS {
            state.remember_resolved(NoteId::local(), NoteId::new(format!("remote-{index}")));
        }
        assert_eq!(state.resolved_ids.len(), MAX_RESOLVED_IDS);
        assert_eq!(state.resolved_order.len(), MAX_RESOLVED_IDS);
        assert_eq!(state.resolve(&first), &first);
    }

    #[tokio::test]
    async fn placeholder_selection_survives_snapshots() {
        let (_store, controller, _subscription) = setup().await;
        let local_id = NoteId::local();
        controller.select(Some(local_id.clone()));
        controller.apply_snapshot(&vec![document("a", "A", at(8), at(10))]);
        assert_eq!(controller.selected_id(), Some(local_id));
    }

    #[tokio::test]
    async fn missing_timestamps_default_to_now() {
        let store = Arc::new(MemoryNoteStore::new());
        store.seed(COLLECTION, Document::new("bare", Fields::new()));
        let controller = NoteController::new(store, COLLECTION);
        let mut subscription = controller.subscribe().await.unwrap();

        let before = now_ms();
        pump(&controller, &mut subscription);
        let note = controller.view().notes[0].clone();
        assert!(note.created_at >= before);
        assert!(note.updated_at >= note.created_at);
    }

    #[tokio::test]
    async fn changes_fire_on_optimistic_and_remote_updates() {
        let (store, controller, mut subscription) = setup().await;
        let mut changes = controller.changes();
        changes.borrow_and_update();

        controller.select(Some(NoteId::new("a")));
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        store.seed(COLLECTION, document("c", "C", at(8), at(11)));
        pump(&controller, &mut subscription);
        assert!(changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn run_applies_snapshots_until_dropped() {
        let (store, controller, subscription) = setup().await;
        let runner = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run(subscription).await }
        });

        store.seed(COLLECTION, document("c", "C", at(8), at(11)));
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while controller.view().notes.len() < 3 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(titles(&controller.view()), vec!["C", "A", "B"]);
        runner.abort();
    }
}
