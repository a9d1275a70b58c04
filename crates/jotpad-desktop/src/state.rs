//! Application state management
//!
//! Global state accessible via Dioxus context providers. Note data lives in
//! the [`NoteController`]; the signals here mirror it for rendering.

use dioxus::prelude::*;

use jotpad_core::editor::EditorDraft;
use jotpad_core::layout::{resolve_layout, Layout, ShellState};
use jotpad_core::{NoteController, NoteEdit, NoteId, NotesView};

use crate::theme::ResolvedTheme;

/// Global application state
#[derive(Clone, Copy)]
pub struct AppState {
    /// Controller owning the note list, overlays and selection
    pub controller: Signal<NoteController>,
    /// Last view published by the controller
    pub view: Signal<NotesView>,
    /// Editor draft for the selected note
    pub draft: Signal<EditorDraft>,
    /// Whether the detail pane is open on narrow windows
    pub shell: Signal<ShellState>,
    /// Window width in logical pixels
    pub viewport_width: Signal<f64>,
    /// Resolved theme (light/dark based on config and system preference)
    pub theme: Signal<ResolvedTheme>,
    /// Whether the markdown preview is shown under the editor
    pub markdown_preview: Signal<bool>,
}

impl AppState {
    fn controller(&self) -> NoteController {
        self.controller.peek().clone()
    }

    /// Layout for the current window width
    #[must_use]
    pub fn layout(&self) -> Layout {
        resolve_layout((self.viewport_width)(), (self.shell)())
    }

    /// Pull the controller's view into the signal right away instead of
    /// waiting for the change notification
    fn refresh(&mut self) {
        let view = self.controller().view();
        self.view.set(view);
    }

    /// Send an edit to the controller in the background
    pub fn save(&self, edit: NoteEdit) {
        let controller = self.controller();
        spawn(async move {
            let id = edit.id.clone();
            if let Err(e) = controller.update(edit).await {
                tracing::error!("Failed to save note {}: {}", id, e);
            }
        });
    }

    /// Propagate whatever the draft still holds
    pub fn flush_draft(&mut self) {
        let edit = self.draft.write().flush();
        if let Some(edit) = edit {
            self.save(edit);
        }
    }

    pub fn select_note(&mut self, id: NoteId) {
        self.flush_draft();
        self.controller().select(Some(id));
        self.shell.write().open_detail();
        self.refresh();
    }

    pub fn create_note(&mut self) {
        self.flush_draft();
        self.shell.write().open_detail();

        let controller = self.controller();
        spawn(async move {
            match controller.create().await {
                Ok(id) => tracing::info!("Created new note: {}", id),
                Err(e) => tracing::error!("Failed to create note: {}", e),
            }
        });
    }

    pub fn delete_note(&mut self, id: NoteId) {
        let deleting_draft = self.draft.peek().note_id() == Some(&id);
        if deleting_draft {
            // The draft's text belongs to the note being removed.
            self.draft.write().sync_selection(None);
        } else {
            self.flush_draft();
        }

        let controller = self.controller();
        spawn(async move {
            match controller.delete(&id).await {
                Ok(()) => tracing::info!("Deleted note: {}", id),
                Err(e) => tracing::error!("Failed to delete note {}: {}", id, e),
            }
        });
    }

    /// Leave the detail pane on narrow windows; the selection is kept
    pub fn back_to_list(&mut self) {
        self.flush_draft();
        self.shell.write().back();
    }
}
