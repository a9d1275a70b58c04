//! Note list component

use dioxus::prelude::*;

use jotpad_core::format::timestamp_label;
use jotpad_core::util::now_ms;

use super::NoteCard;
use crate::state::AppState;

const PREVIEW_CHARS: usize = 80;

/// First non-blank line of the content, shortened for the row preview
fn preview_line(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

/// List of notes, newest first
#[component]
pub fn NoteList(full_width: bool) -> Element {
    let state = use_context::<AppState>();
    let view = (state.view)();
    let selected_id = view.selected_id().cloned();
    let colors = (state.theme)().palette();
    let now = now_ms();

    let width = if full_width { "100%" } else { "280px" };
    let border = if full_width {
        "none".to_string()
    } else {
        format!("1px solid {}", colors.border)
    };

    rsx! {
        div {
            class: "note-list",
            style: "
                width: {width};
                flex-shrink: 0;
                border-right: {border};
                overflow-y: auto;
                background: {colors.bg_primary};
            ",

            if view.notes.is_empty() {
                div {
                    style: "
                        padding: 20px;
                        text-align: center;
                        color: {colors.text_muted};
                    ",
                    "No notes yet"
                }
            } else {
                for note in view.notes {
                    {
                        let is_selected = selected_id.as_ref() == Some(&note.id);
                        let title = note.display_title().to_string();
                        let preview = preview_line(&note.content);
                        let timestamp = timestamp_label(note.updated_at, now);
                        let select_id = note.id.clone();
                        let delete_id = note.id.clone();
                        let mut state = state;

                        rsx! {
                            NoteCard {
                                key: "{note.id}",
                                title,
                                preview,
                                timestamp,
                                is_selected,
                                onclick: move |_| {
                                    state.select_note(select_id.clone());
                                },
                                ondelete: move |_| {
                                    state.delete_note(delete_id.clone());
                                },
                            }
                        }
                    }
                }
            }
        }
    }
}
