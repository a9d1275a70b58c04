//! Toolbar components with actions

use dioxus::prelude::*;

use crate::state::AppState;

/// Top bar with the persistent "New note" action
#[component]
pub fn Toolbar() -> Element {
    let mut state = use_context::<AppState>();
    let colors = (state.theme)().palette();
    let count = state.view.read().notes.len();

    rsx! {
        div {
            class: "toolbar",
            style: "
                display: flex;
                align-items: center;
                justify-content: space-between;
                padding: 8px 16px;
                border-bottom: 1px solid {colors.border};
                background: {colors.bg_secondary};
            ",

            div {
                style: "font-weight: 600;",
                "Notes "
                span {
                    style: "font-weight: 400; color: {colors.text_muted};",
                    "({count})"
                }
            }

            button {
                class: "new-note",
                style: "
                    border: none;
                    border-radius: 6px;
                    padding: 6px 12px;
                    cursor: pointer;
                    background: {colors.accent};
                    color: {colors.accent_text};
                ",
                onclick: move |_| state.create_note(),
                "New note"
            }
        }
    }
}

/// Top bar of the single-pane detail view
#[component]
pub fn BackBar() -> Element {
    let mut state = use_context::<AppState>();
    let colors = (state.theme)().palette();

    rsx! {
        div {
            class: "back-bar",
            style: "
                display: flex;
                align-items: center;
                justify-content: space-between;
                padding: 8px 16px;
                border-bottom: 1px solid {colors.border};
                background: {colors.bg_secondary};
            ",

            button {
                class: "back",
                style: "
                    border: none;
                    background: transparent;
                    cursor: pointer;
                    color: {colors.accent};
                    font-size: 14px;
                ",
                onclick: move |_| state.back_to_list(),
                "‹ Notes"
            }

            button {
                class: "new-note",
                style: "
                    border: none;
                    border-radius: 6px;
                    padding: 6px 12px;
                    cursor: pointer;
                    background: {colors.accent};
                    color: {colors.accent_text};
                ",
                onclick: move |_| state.create_note(),
                "New note"
            }
        }
    }
}
