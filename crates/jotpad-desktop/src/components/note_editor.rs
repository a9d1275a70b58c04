//! Note editor component

use dioxus::prelude::*;

use jotpad_core::editor::EditField;
use jotpad_core::models::UNTITLED;

use super::MarkdownPreview;
use crate::state::AppState;

/// Title and content editor for the selected note
#[component]
pub fn NoteEditor() -> Element {
    let mut state = use_context::<AppState>();
    let colors = (state.theme)().palette();
    let draft = state.draft.read();

    if draft.note_id().is_none() {
        return rsx! {
            div {
                class: "note-editor empty",
                style: "
                    flex: 1;
                    display: flex;
                    align-items: center;
                    justify-content: center;
                    color: {colors.text_muted};
                ",
                "Select a note or create a new one"
            }
        };
    }

    let title = draft.title().to_string();
    let content = draft.content().to_string();
    drop(draft);
    let show_preview = (state.markdown_preview)();

    let mut edit_field = move |field: EditField, value: String| {
        let edit = state.draft.write().input(field, value);
        if let Some(edit) = edit {
            state.save(edit);
        }
    };
    let mut leave_field = move |field: EditField| {
        let edit = state.draft.write().blur(field);
        if let Some(edit) = edit {
            state.save(edit);
        }
    };

    rsx! {
        div {
            class: "note-editor",
            style: "
                flex: 1;
                display: flex;
                flex-direction: column;
                min-width: 0;
                background: {colors.bg_primary};
            ",

            input {
                class: "note-title-input",
                r#type: "text",
                placeholder: UNTITLED,
                value: "{title}",
                style: "
                    border: none;
                    outline: none;
                    padding: 16px 20px 8px;
                    font-size: 20px;
                    font-weight: 600;
                    background: transparent;
                    color: {colors.text_primary};
                ",
                oninput: move |evt| edit_field(EditField::Title, evt.value()),
                onblur: move |_| leave_field(EditField::Title),
            }

            textarea {
                class: "note-content-input",
                placeholder: "Start writing...",
                value: "{content}",
                style: "
                    flex: 1;
                    border: none;
                    outline: none;
                    resize: none;
                    padding: 8px 20px 16px;
                    font-family: inherit;
                    font-size: 14px;
                    line-height: 1.6;
                    background: transparent;
                    color: {colors.text_primary};
                ",
                oninput: move |evt| edit_field(EditField::Content, evt.value()),
                onblur: move |_| leave_field(EditField::Content),
            }

            if show_preview && !content.trim().is_empty() {
                MarkdownPreview { content: content.clone() }
            }
        }
    }
}
