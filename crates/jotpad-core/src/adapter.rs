//! Conversion between [`Note`] and the store's document shape.
//!
//! Reads never fail: missing or malformed fields fall back to empty text and
//! to the current time for timestamps.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Note, NoteEdit, NoteId};
use crate::store::{Document, FieldValue, Fields};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// Read a timestamp field as Unix milliseconds, if it holds one.
///
/// Accepts store-native timestamps, integer or float milliseconds, and
/// RFC 3339 text. Negative values are rejected.
pub fn timestamp_millis(value: &FieldValue) -> Option<i64> {
    let millis = match value {
        FieldValue::Timestamp(at) => at.timestamp_millis(),
        FieldValue::Integer(ms) => *ms,
        #[allow(clippy::cast_possible_truncation)]
        FieldValue::Double(ms) if ms.is_finite() => ms.round() as i64,
        FieldValue::Text(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()?
            .timestamp_millis(),
        _ => return None,
    };
    (millis >= 0).then_some(millis)
}

/// Coerce an optional timestamp field, defaulting to `now_ms`
pub fn coerce_timestamp(value: Option<&FieldValue>, now_ms: i64) -> i64 {
    value.and_then(timestamp_millis).unwrap_or(now_ms)
}

fn text_field(fields: &Fields, name: &str) -> String {
    match fields.get(name) {
        Some(FieldValue::Text(text)) => text.clone(),
        _ => String::new(),
    }
}

/// Build a [`Note`] from a raw document.
pub fn note_from_document(document: &Document, now_ms: i64) -> Note {
    let created_at = coerce_timestamp(document.fields.get(FIELD_CREATED_AT), now_ms);
    let updated_at = coerce_timestamp(document.fields.get(FIELD_UPDATED_AT), now_ms);

    Note {
        id: NoteId::new(document.id.clone()),
        title: text_field(&document.fields, FIELD_TITLE),
        content: text_field(&document.fields, FIELD_CONTENT),
        created_at,
        updated_at: updated_at.max(created_at),
    }
}

fn timestamp_value(ms: i64) -> FieldValue {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map_or(FieldValue::Integer(ms), FieldValue::Timestamp)
}

/// Fields for a brand-new empty note
pub fn fields_for_create(now_ms: i64) -> Fields {
    Fields::from([
        (FIELD_TITLE.to_string(), FieldValue::Text(String::new())),
        (FIELD_CONTENT.to_string(), FieldValue::Text(String::new())),
        (FIELD_CREATED_AT.to_string(), timestamp_value(now_ms)),
        (FIELD_UPDATED_AT.to_string(), timestamp_value(now_ms)),
    ])
}

/// Fields for writing an edit: the changed fields plus a fresh `updatedAt`
pub fn fields_for_update(edit: &NoteEdit, now_ms: i64) -> Fields {
    let mut fields = Fields::new();
    if let Some(title) = &edit.title {
        fields.insert(FIELD_TITLE.to_string(), FieldValue::Text(title.clone()));
    }
    if let Some(content) = &edit.content {
        fields.insert(FIELD_CONTENT.to_string(), FieldValue::Text(content.clone()));
    }
    fields.insert(FIELD_UPDATED_AT.to_string(), timestamp_value(now_ms));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn coerces_native_timestamp() {
        let at = Utc.timestamp_millis_opt(1_600_000_000_123).unwrap();
        assert_eq!(
            coerce_timestamp(Some(&FieldValue::Timestamp(at)), NOW),
            1_600_000_000_123
        );
    }

    #[test]
    fn coerces_numeric_and_text_timestamps() {
        assert_eq!(coerce_timestamp(Some(&FieldValue::Integer(42)), NOW), 42);
        assert_eq!(coerce_timestamp(Some(&FieldValue::Double(41.6)), NOW), 42);
        assert_eq!(
            coerce_timestamp(
                Some(&FieldValue::Text("2020-09-13T12:26:40Z".to_string())),
                NOW
            ),
            1_600_000_000_000
        );
    }

    #[test]
    fn missing_or_malformed_timestamps_default_to_now() {
        assert_eq!(coerce_timestamp(None, NOW), NOW);
        assert_eq!(coerce_timestamp(Some(&FieldValue::Null), NOW), NOW);
        assert_eq!(
            coerce_timestamp(Some(&FieldValue::Text("yesterday".to_string())), NOW),
            NOW
        );
        assert_eq!(coerce_timestamp(Some(&FieldValue::Integer(-5)), NOW), NOW);
        assert_eq!(
            coerce_timestamp(Some(&FieldValue::Double(f64::NAN)), NOW),
            NOW
        );
    }

    #[test]
    fn note_from_sparse_document_uses_defaults() {
        let note = note_from_document(&Document::new("abc", Fields::new()), NOW);
        assert_eq!(note.id, NoteId::new("abc"));
        assert_eq!(note.title, "");
        assert_eq!(note.content, "");
        assert_eq!(note.created_at, NOW);
        assert_eq!(note.updated_at, NOW);
    }

    #[test]
    fn updated_at_is_clamped_to_created_at() {
        let fields = Fields::from([
            (FIELD_CREATED_AT.to_string(), FieldValue::Integer(5_000)),
            (FIELD_UPDATED_AT.to_string(), FieldValue::Integer(1_000)),
        ]);
        let note = note_from_document(&Document::new("abc", fields), NOW);
        assert_eq!(note.created_at, 5_000);
        assert_eq!(note.updated_at, 5_000);
    }

    #[test]
    fn non_text_title_reads_as_empty() {
        let fields = Fields::from([(FIELD_TITLE.to_string(), FieldValue::Integer(7))]);
        let note = note_from_document(&Document::new("abc", fields), NOW);
        assert_eq!(note.title, "");
    }

    #[test]
    fn create_fields_are_empty_with_equal_timestamps() {
        let fields = fields_for_create(NOW);
        let note = note_from_document(&Document::new("n", fields), 0);
        assert_eq!(note.title, "");
        assert_eq!(note.content, "");
        assert_eq!(note.created_at, NOW);
        assert_eq!(note.updated_at, NOW);
    }

    #[test]
    fn update_fields_carry_only_changes_and_never_created_at() {
        let edit = NoteEdit::title(NoteId::new("n"), "Plans");
        let fields = fields_for_update(&edit, NOW);
        assert_eq!(
            fields.keys().cloned().collect::<Vec<_>>(),
            vec![FIELD_TITLE.to_string(), FIELD_UPDATED_AT.to_string()]
        );
    }

    #[test]
    fn written_fields_read_back_unchanged() {
        let mut fields = fields_for_create(NOW);
        let edit = NoteEdit {
            id: NoteId::new("n"),
            title: Some("Title".to_string()),
            content: Some("# Heading\n\nbody".to_string()),
        };
        fields.extend(fields_for_update(&edit, NOW + 10));

        let note = note_from_document(&Document::new("n", fields), 0);
        assert_eq!(note.title, "Title");
        assert_eq!(note.content, "# Heading\n\nbody");
        assert_eq!(note.created_at, NOW);
        assert_eq!(note.updated_at, NOW + 10);
    }
}
