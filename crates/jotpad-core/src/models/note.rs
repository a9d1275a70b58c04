//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const LOCAL_ID_PREFIX: &str = "local-";

/// Placeholder shown for notes without a title
pub const UNTITLED: &str = "Untitled";

/// Identifier of a note.
///
/// Store-assigned ids are opaque strings. A note that has been created locally
/// but not yet acknowledged by the store carries a `local-` placeholder id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wrap a store-assigned identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fabricate a placeholder id for a note whose create is still in flight
    #[must_use]
    pub fn local() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Whether this is a placeholder id rather than a store-assigned one
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Title, may be empty
    pub title: String,
    /// Markdown content, may be empty
    pub content: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Create an empty note with both timestamps set to `now_ms`
    #[must_use]
    pub fn empty(id: NoteId, now_ms: i64) -> Self {
        Self {
            id,
            title: String::new(),
            content: String::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Title for display, falling back to a placeholder when blank
    #[must_use]
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            UNTITLED
        } else {
            title
        }
    }

    /// Apply an edit in place and refresh `updated_at`.
    ///
    /// `updated_at` never moves backwards and never drops below `created_at`.
    pub fn apply(&mut self, edit: &NoteEdit, now_ms: i64) {
        if let Some(title) = &edit.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &edit.content {
            self.content.clone_from(content);
        }
        self.updated_at = now_ms.max(self.updated_at).max(self.created_at);
    }
}

/// A change to the mutable fields of one note.
///
/// `None` means the field is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEdit {
    /// Target note
    pub id: NoteId,
    /// New title, if changed
    pub title: Option<String>,
    /// New content, if changed
    pub content: Option<String>,
}

impl NoteEdit {
    /// Edit that replaces the title
    pub fn title(id: NoteId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            content: None,
        }
    }

    /// Edit that replaces the content
    pub fn content(id: NoteId, content: impl Into<String>) -> Self {
        Self {
            id,
            title: None,
            content: Some(content.into()),
        }
    }

    /// Whether the edit changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_ids_are_unique_and_marked() {
        let id1 = NoteId::local();
        let id2 = NoteId::local();
        assert_ne!(id1, id2);
        assert!(id1.is_local());
        assert!(!NoteId::new("abc123").is_local());
    }

    #[test]
    fn test_note_empty() {
        let note = Note::empty(NoteId::new("n1"), 1_000);
        assert!(note.title.is_empty());
        assert!(note.content.is_empty());
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_display_title_placeholder() {
        let mut note = Note::empty(NoteId::new("n1"), 1_000);
        assert_eq!(note.display_title(), UNTITLED);
        note.title = "  Groceries ".to_string();
        assert_eq!(note.display_title(), "Groceries");
    }

    #[test]
    fn test_apply_refreshes_updated_at_only() {
        let mut note = Note::empty(NoteId::new("n1"), 1_000);
        note.apply(&NoteEdit::content(note.id.clone(), "hello"), 5_000);
        assert_eq!(note.content, "hello");
        assert_eq!(note.created_at, 1_000);
        assert_eq!(note.updated_at, 5_000);
    }

    #[test]
    fn test_apply_never_moves_updated_at_backwards() {
        let mut note = Note::empty(NoteId::new("n1"), 1_000);
        note.updated_at = 9_000;
        note.apply(&NoteEdit::title(note.id.clone(), "t"), 2_000);
        assert_eq!(note.updated_at, 9_000);
        assert!(note.updated_at >= note.created_at);
    }

    #[test]
    fn test_note_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&NoteId::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
