//! UI Components
//!
//! Reusable UI components for the desktop application.

mod markdown_preview;
mod note_card;
mod note_editor;
mod note_list;
mod toolbar;

pub use markdown_preview::MarkdownPreview;
pub use note_card::NoteCard;
pub use note_editor::NoteEditor;
pub use note_list::NoteList;
pub use toolbar::{BackBar, Toolbar};
