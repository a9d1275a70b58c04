//! Data models for Jotpad

mod note;

pub use note::{Note, NoteEdit, NoteId, UNTITLED};
