//! Home view - the responsive shell

use dioxus::prelude::*;

use jotpad_core::layout::Layout;

use crate::components::{BackBar, NoteEditor, NoteList, Toolbar};
use crate::state::AppState;

/// Home view component - picks panes from the window width
#[component]
pub fn Home() -> Element {
    let state = use_context::<AppState>();
    let layout = state.layout();

    rsx! {
        div {
            class: "home-container",
            style: "display: flex; flex-direction: column; height: 100vh;",

            {match layout {
                Layout::TwoPane => rsx! {
                    Toolbar {}
                    div {
                        class: "content-area",
                        style: "flex: 1; display: flex; overflow: hidden;",

                        NoteList { full_width: false }
                        NoteEditor {}
                    }
                },
                Layout::List => rsx! {
                    Toolbar {}
                    div {
                        class: "content-area",
                        style: "flex: 1; display: flex; overflow: hidden;",

                        NoteList { full_width: true }
                    }
                },
                Layout::Detail => rsx! {
                    BackBar {}
                    div {
                        class: "content-area",
                        style: "flex: 1; display: flex; overflow: hidden;",

                        NoteEditor {}
                    }
                },
            }}
        }
    }
}
