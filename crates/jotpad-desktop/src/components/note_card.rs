//! Note card component

use dioxus::prelude::*;

use crate::state::AppState;

/// A single note row rendered in the note list.
#[component]
pub fn NoteCard(
    title: String,
    preview: String,
    timestamp: String,
    is_selected: bool,
    onclick: EventHandler<MouseEvent>,
    ondelete: EventHandler<MouseEvent>,
) -> Element {
    let state = use_context::<AppState>();
    let colors = (state.theme)().palette();

    let bg = if is_selected {
        colors.bg_tertiary
    } else {
        colors.bg_primary
    };
    let border_left = if is_selected {
        format!("3px solid {}", colors.accent)
    } else {
        "3px solid transparent".to_string()
    };

    rsx! {
        div {
            class: if is_selected { "note-item selected" } else { "note-item" },
            style: "
                display: flex;
                align-items: flex-start;
                gap: 8px;
                padding: 12px 16px;
                border-bottom: 1px solid {colors.border_light};
                border-left: {border_left};
                cursor: pointer;
                background: {bg};
                transition: background 0.15s;
            ",
            onclick: move |evt| onclick.call(evt),

            div {
                style: "flex: 1; min-width: 0;",

                div {
                    class: "note-title",
                    style: "
                        font-weight: 500;
                        margin-bottom: 4px;
                        overflow: hidden;
                        text-overflow: ellipsis;
                        white-space: nowrap;
                        color: {colors.text_primary};
                    ",
                    "{title}"
                }

                div {
                    class: "note-preview",
                    style: "
                        font-size: 12px;
                        color: {colors.text_secondary};
                        overflow: hidden;
                        text-overflow: ellipsis;
                        white-space: nowrap;
                    ",
                    "{preview}"
                }

                div {
                    class: "note-timestamp",
                    style: "
                        margin-top: 4px;
                        font-size: 11px;
                        color: {colors.text_muted};
                    ",
                    "{timestamp}"
                }
            }

            button {
                class: "note-delete",
                title: "Delete note",
                style: "
                    border: none;
                    background: transparent;
                    color: {colors.text_muted};
                    cursor: pointer;
                    font-size: 14px;
                    padding: 2px 6px;
                ",
                onclick: move |evt: MouseEvent| {
                    // Deleting must not also select the row
                    evt.stop_propagation();
                    ondelete.call(evt);
                },
                "✕"
            }
        }
    }
}
