//! Main application component

use std::sync::Arc;
use std::time::Duration;

use dioxus::desktop::window;
use dioxus::prelude::*;

use jotpad_core::config::ClientConfig;
use jotpad_core::editor::EditorDraft;
use jotpad_core::layout::ShellState;
use jotpad_core::store::{MemoryNoteStore, NoteStore};
use jotpad_core::{NoteController, NotesView};

use crate::state::AppState;
use crate::theme::resolve_theme;
use crate::views::Home;

/// How often the window width is re-measured
const VIEWPORT_POLL_MS: u64 = 250;

/// Width assumed until the first measurement
const INITIAL_VIEWPORT_WIDTH: f64 = 1024.0;

fn build_controller(config: &ClientConfig) -> NoteController {
    let store: Arc<dyn NoteStore> = match config.build_store() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open note store: {}. Using in-memory store.", e);
            Arc::new(MemoryNoteStore::new())
        }
    };
    NoteController::new(store, config.collection.clone())
}

/// Root application component
#[component]
pub fn App() -> Element {
    let config = use_context::<ClientConfig>();

    let controller = use_signal(|| build_controller(&config));
    let mut view = use_signal(NotesView::default);
    let mut draft = use_signal(|| EditorDraft::new(config.edit_policy));
    let shell = use_signal(ShellState::default);
    let mut viewport_width = use_signal(|| INITIAL_VIEWPORT_WIDTH);
    let theme = use_signal(|| resolve_theme(config.theme));
    let markdown_preview = use_signal(|| config.markdown_preview);

    // One live query for the lifetime of the window
    use_future(move || async move {
        let controller = controller.peek().clone();
        match controller.subscribe().await {
            Ok(subscription) => controller.run(subscription).await,
            Err(e) => tracing::error!("Failed to subscribe to notes: {}", e),
        }
    });

    // Mirror controller changes into the view signal
    use_future(move || async move {
        let mut changes = controller.peek().changes();
        while changes.changed().await.is_ok() {
            let next = controller.peek().view();
            view.set(next);
        }
    });

    // Track the window's logical width for the responsive layout
    use_future(move || async move {
        loop {
            let desktop = window();
            let width = desktop
                .inner_size()
                .to_logical::<f64>(desktop.scale_factor())
                .width;
            if (width - *viewport_width.peek()).abs() >= 1.0 {
                viewport_width.set(width);
            }
            tokio::time::sleep(Duration::from_millis(VIEWPORT_POLL_MS)).await;
        }
    });

    // Re-seed the editor draft when the selection changes
    use_effect(move || {
        let selected = view.read().selected.clone();
        let selected_id = selected.as_ref().map(|note| &note.id);

        let local_id = {
            let current = draft.peek();
            if current.note_id() == selected_id {
                return;
            }
            current.note_id().filter(|id| id.is_local()).cloned()
        };

        let mut draft = draft.write();
        if let Some(local_id) = local_id {
            let resolved = controller.peek().resolve_id(&local_id);
            if resolved != local_id {
                draft.rekey(resolved);
            }
        }
        draft.sync_selection(selected.as_ref());
    });

    use_context_provider(|| AppState {
        controller,
        view,
        draft,
        shell,
        viewport_width,
        theme,
        markdown_preview,
    });

    let current_theme = theme();
    let colors = current_theme.palette();
    let theme_attr = current_theme.attr();

    rsx! {
        div {
            class: "app-container",
            "data-theme": "{theme_attr}",
            style: "
                height: 100vh;
                font-family: system-ui, -apple-system, sans-serif;
                font-size: 14px;
                background: {colors.bg_primary};
                color: {colors.text_primary};
            ",
            Home {}
        }
    }
}
