//! Read-only markdown preview

use dioxus::prelude::*;

use jotpad_core::editor::render_markdown;

use crate::state::AppState;

#[component]
pub fn MarkdownPreview(content: String) -> Element {
    let state = use_context::<AppState>();
    let colors = (state.theme)().palette();
    let html = render_markdown(&content);

    rsx! {
        div {
            class: "markdown-preview",
            style: "
                border-top: 1px solid {colors.border_light};
                padding: 12px 16px;
                overflow-y: auto;
                max-height: 40%;
                color: {colors.text_primary};
                background: {colors.bg_secondary};
                line-height: 1.5;
            ",
            dangerous_inner_html: "{html}",
        }
    }
}
