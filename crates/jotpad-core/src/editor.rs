//! Editor draft state and markdown preview.
//!
//! The draft holds what the user is typing for the selected note and decides,
//! per [`EditPolicy`], when a change becomes a [`NoteEdit`] for the controller.

use std::fmt;
use std::str::FromStr;

use pulldown_cmark::{html, Event, Options, Parser};
use serde::{Deserialize, Serialize};

use crate::models::{Note, NoteEdit, NoteId};

/// When typed changes are propagated to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EditPolicy {
    /// Every keystroke is written
    Immediate,
    /// Changes are written once the field loses focus
    #[default]
    OnBlur,
}

impl fmt::Display for EditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => f.write_str("immediate"),
            Self::OnBlur => f.write_str("on-blur"),
        }
    }
}

impl FromStr for EditPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" | "keystroke" => Ok(Self::Immediate),
            "on-blur" | "on_blur" | "blur" => Ok(Self::OnBlur),
            other => Err(format!(
                "unknown edit policy '{other}' (expected 'immediate' or 'on-blur')"
            )),
        }
    }
}

/// Editable field of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Title,
    Content,
}

/// Local draft for the selected note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorDraft {
    policy: EditPolicy,
    note_id: Option<NoteId>,
    title: String,
    content: String,
    /// Values last handed to the controller (or seeded from the note)
    committed_title: String,
    committed_content: String,
}

impl EditorDraft {
    pub fn new(policy: EditPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub const fn policy(&self) -> EditPolicy {
        self.policy
    }

    pub const fn note_id(&self) -> Option<&NoteId> {
        self.note_id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether typed text has not been handed to the controller yet
    pub fn has_pending(&self) -> bool {
        self.title != self.committed_title || self.content != self.committed_content
    }

    /// Re-seed the draft when the selection changes.
    ///
    /// Returns `true` when the draft was re-seeded. Unflushed text of the
    /// previous note is discarded; call [`Self::flush`] first to keep it.
    pub fn sync_selection(&mut self, selected: Option<&Note>) -> bool {
        let selected_id = selected.map(|note| &note.id);
        if selected_id == self.note_id.as_ref() {
            return false;
        }

        match selected {
            Some(note) => {
                self.note_id = Some(note.id.clone());
                self.title.clone_from(&note.title);
                self.content.clone_from(&note.content);
            }
            None => {
                self.note_id = None;
                self.title.clear();
                self.content.clear();
            }
        }
        self.committed_title.clone_from(&self.title);
        self.committed_content.clone_from(&self.content);
        true
    }

    /// Follow the note to a new id (a placeholder replaced by the store's id)
    /// without touching the typed text
    pub fn rekey(&mut self, id: NoteId) {
        if self.note_id.is_some() {
            self.note_id = Some(id);
        }
    }

    /// Record typed text; under [`EditPolicy::Immediate`] returns the edit to send
    pub fn input(&mut self, field: EditField, value: String) -> Option<NoteEdit> {
        self.note_id.as_ref()?;
        match field {
            EditField::Title => self.title = value,
            EditField::Content => self.content = value,
        }
        match self.policy {
            EditPolicy::Immediate => self.take_edit(field),
            EditPolicy::OnBlur => None,
        }
    }

    /// Field lost focus; under [`EditPolicy::OnBlur`] returns the edit to send
    pub fn blur(&mut self, field: EditField) -> Option<NoteEdit> {
        match self.policy {
            EditPolicy::Immediate => None,
            EditPolicy::OnBlur => self.take_edit(field),
        }
    }

    /// Everything not yet propagated, as one edit
    pub fn flush(&mut self) -> Option<NoteEdit> {
        let id = self.note_id.clone()?;
        let title = (self.title != self.committed_title).then(|| self.title.clone());
        let content = (self.content != self.committed_content).then(|| self.content.clone());
        if title.is_none() && content.is_none() {
            return None;
        }
        self.committed_title.clone_from(&self.title);
        self.committed_content.clone_from(&self.content);
        Some(NoteEdit { id, title, content })
    }

    fn take_edit(&mut self, field: EditField) -> Option<NoteEdit> {
        let id = self.note_id.clone()?;
        match field {
            EditField::Title if self.title != self.committed_title => {
                self.committed_title.clone_from(&self.title);
                Some(NoteEdit::title(id, self.title.clone()))
            }
            EditField::Content if self.content != self.committed_content => {
                self.committed_content.clone_from(&self.content);
                Some(NoteEdit::content(id, self.content.clone()))
            }
            _ => None,
        }
    }
}

/// Render note content as HTML for the read-only preview.
///
/// Raw HTML in the source is dropped rather than passed through.
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(content, options)
        .filter(|event| !matches!(event, Event::Html(_) | Event::InlineHtml(_)));

    let mut rendered = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut rendered, parser);
    rendered
}
