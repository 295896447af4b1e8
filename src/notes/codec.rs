//! notes.json reader/writer
//!
//! Document shape: `{"notes": [...], "archived_notes": [...]}`. Each entry is
//! a named-field object. Older files stored positional arrays
//! (`[title, content, color, tags, pinned, archived, reminder, files,
//! collaborators, drawing]`), possibly short; both shapes are read and any
//! missing or mistyped field takes its default.
//!
//! Loading never fails: a missing file, unreadable file or malformed JSON
//! yields an empty store and a log line. Saving overwrites the whole file.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::NoteflowError;
use crate::notes::NoteStore;
use crate::types::{Note, Reminder, DEFAULT_COLOR, DEFAULT_TITLE};

const NOTES_KEY: &str = "notes";
const ARCHIVED_KEY: &str = "archived_notes";

// ============================================================================
// Serialize
// ============================================================================

fn serialize_batch(notes: &[Note], label: &str) -> Vec<Value> {
    notes
        .iter()
        .filter_map(|note| match serde_json::to_value(note) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Dropping {} note '{}' from save: {}", label, note.title, e);
                None
            }
        })
        .collect()
}

/// Build the JSON document for both collections.
pub fn to_document(store: &NoteStore) -> Value {
    let mut doc = Map::new();
    doc.insert(
        NOTES_KEY.to_string(),
        Value::Array(serialize_batch(store.active(), "active")),
    );
    doc.insert(
        ARCHIVED_KEY.to_string(),
        Value::Array(serialize_batch(store.archived(), "archived")),
    );
    Value::Object(doc)
}

/// Document text, indented four spaces like the files older versions wrote.
pub fn to_json_string(store: &NoteStore) -> Result<String, NoteflowError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    to_document(store)
        .serialize(&mut ser)
        .map_err(|e| NoteflowError::Io(format!("Failed to serialize notes: {}", e)))?;
    String::from_utf8(out).map_err(|e| NoteflowError::Io(format!("Failed to serialize notes: {}", e)))
}

/// Overwrite `path` with the store contents.
pub fn save_to_path(path: &Path, store: &NoteStore) -> Result<(), NoteflowError> {
    let content = to_json_string(store)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| NoteflowError::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }
    fs::write(path, content).map_err(|e| NoteflowError::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    log::info!(
        "Saved {} notes and {} archived notes to {}",
        store.active().len(),
        store.archived().len(),
        path.display()
    );
    Ok(())
}

// ============================================================================
// Deserialize
// ============================================================================

fn string_field(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

fn bool_field(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

fn list_field(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn reminder_field(value: Option<&Value>) -> Option<Reminder> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => {
            let parsed = Reminder::parse(s);
            if parsed.is_none() {
                log::warn!("Ignoring unparseable reminder '{}'", s);
            }
            parsed
        }
        _ => None,
    }
}

fn from_positional(fields: &[Value]) -> Note {
    Note {
        title: string_field(fields.first(), DEFAULT_TITLE),
        content: string_field(fields.get(1), ""),
        color: string_field(fields.get(2), DEFAULT_COLOR),
        tags: string_field(fields.get(3), ""),
        pinned: bool_field(fields.get(4)),
        archived: bool_field(fields.get(5)),
        reminder: reminder_field(fields.get(6)),
        attached_files: list_field(fields.get(7)),
        collaborators: list_field(fields.get(8)),
        drawing: string_field(fields.get(9), ""),
    }
}

fn from_named(map: &Map<String, Value>) -> Note {
    Note {
        title: string_field(map.get("title"), DEFAULT_TITLE),
        content: string_field(map.get("content"), ""),
        color: string_field(map.get("color"), DEFAULT_COLOR),
        tags: string_field(map.get("tags"), ""),
        pinned: bool_field(map.get("pinned")),
        archived: bool_field(map.get("archived")),
        reminder: reminder_field(map.get("reminder")),
        attached_files: list_field(map.get("attached_files")),
        collaborators: list_field(map.get("collaborators")),
        drawing: string_field(map.get("drawing"), ""),
    }
}

/// Read one entry in either shape. Scalars are not notes.
pub fn note_from_value(value: &Value) -> Option<Note> {
    match value {
        Value::Array(fields) => Some(from_positional(fields)),
        Value::Object(map) => Some(from_named(map)),
        other => {
            log::warn!("Skipping note entry that is neither object nor array: {}", other);
            None
        }
    }
}

fn read_batch(doc: &Value, key: &str) -> Vec<Note> {
    match doc.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(note_from_value).collect(),
        _ => Vec::new(),
    }
}

/// Read both collections from a parsed document.
pub fn from_document(doc: &Value) -> NoteStore {
    NoteStore::from_collections(read_batch(doc, NOTES_KEY), read_batch(doc, ARCHIVED_KEY))
}

/// Parse document text. Malformed JSON yields an empty store.
pub fn from_json_str(content: &str) -> NoteStore {
    match serde_json::from_str::<Value>(content) {
        Ok(doc) => from_document(&doc),
        Err(e) => {
            log::warn!("Notes file is not valid JSON ({}). Starting empty.", e);
            NoteStore::new()
        }
    }
}

/// Load the store from `path`. No file means no notes yet.
pub fn load_from_path(path: &Path) -> NoteStore {
    if !path.exists() {
        log::info!("No notes file at {}. Starting empty.", path.display());
        return NoteStore::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => {
            let store = from_json_str(&content);
            log::info!(
                "Loaded {} notes and {} archived notes from {}",
                store.active().len(),
                store.archived().len(),
                path.display()
            );
            store
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}. Starting empty.", path.display(), e);
            NoteStore::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn full_note() -> Note {
        let at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(18, 30, 42)
            .unwrap();
        Note {
            title: "Test Note".into(),
            content: "Content here".into(),
            color: "#e0f7fa".into(),
            tags: "tag1".into(),
            pinned: true,
            archived: false,
            reminder: Some(Reminder::new(at)),
            attached_files: vec!["file1.txt".into()],
            collaborators: vec!["user1".into()],
            drawing: "drawing1".into(),
        }
    }

    #[test]
    fn legacy_two_field_record_is_padded() {
        let store = from_json_str(r#"{"notes": [["A","B"]], "archived_notes": []}"#);
        assert_eq!(store.active().len(), 1);
        let note = &store.active()[0];
        assert_eq!(note.title, "A");
        assert_eq!(note.content, "B");
        assert_eq!(note.color, "#fff3e0");
        assert_eq!(note.tags, "");
        assert!(!note.pinned);
        assert!(!note.archived);
        assert_eq!(note.reminder, None);
        assert!(note.attached_files.is_empty());
        assert!(note.collaborators.is_empty());
        assert_eq!(note.drawing, "");
        assert!(store.archived().is_empty());
    }

    #[test]
    fn named_fields_with_gaps_take_defaults() {
        let store = from_json_str(r#"{"notes": [{"content": "only body"}]}"#);
        let note = &store.active()[0];
        assert_eq!(note.title, "Untitled");
        assert_eq!(note.content, "only body");
        assert_eq!(note.color, "#fff3e0");
    }

    #[test]
    fn round_trip_preserves_records() {
        let mut store = NoteStore::new();
        store.add(full_note());
        store.add(Note::new("Short Note", "Less fields"));
        let mut old = Note::new("Archived Note", "Old content").with_tags("old");
        old.archived = true;
        let store = NoteStore::from_collections(store.active().to_vec(), vec![old]);

        let text = to_json_string(&store).unwrap();
        let loaded = from_json_str(&text);
        assert_eq!(loaded, store);
    }

    #[test]
    fn reminder_serializes_as_minute_string_or_empty() {
        let mut store = NoteStore::new();
        store.add(full_note());
        store.add(Note::new("no reminder", "x"));
        let doc = to_document(&store);
        assert_eq!(doc["notes"][0]["reminder"], json!("2025-06-01 18:30"));
        assert_eq!(doc["notes"][1]["reminder"], json!(""));
        assert_eq!(doc["archived_notes"], json!([]));
    }

    #[test]
    fn serialized_object_has_all_fields() {
        let mut store = NoteStore::new();
        store.add(full_note());
        let doc = to_document(&store);
        let obj = doc["notes"][0].as_object().unwrap();
        for key in [
            "title",
            "content",
            "color",
            "tags",
            "pinned",
            "archived",
            "reminder",
            "attached_files",
            "collaborators",
            "drawing",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn bad_reminder_becomes_none() {
        let store = from_json_str(
            r##"{"notes": [{"title": "t", "reminder": "next tuesday"}, ["u", "c", "#fff", "", false, false, "2025-01-02 03:04"]]}"##,
        );
        assert_eq!(store.active()[0].reminder, None);
        assert_eq!(
            store.active()[1].reminder.map(|r| r.to_string()),
            Some("2025-01-02 03:04".to_string())
        );
    }

    #[test]
    fn mistyped_fields_default() {
        let store = from_json_str(
            r#"{"notes": [{"title": 7, "pinned": "yes", "attached_files": "a.txt", "collaborators": ["x", 3]}]}"#,
        );
        let note = &store.active()[0];
        assert_eq!(note.title, "Untitled");
        assert!(!note.pinned);
        assert!(note.attached_files.is_empty());
        assert_eq!(note.collaborators, vec!["x".to_string(), "3".to_string()]);
    }

    #[test]
    fn scalar_entries_are_skipped() {
        let store = from_json_str(r#"{"notes": ["oops", ["kept"]]}"#);
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.active()[0].title, "kept");
    }

    #[test]
    fn malformed_json_yields_empty_store() {
        let store = from_json_str("{ not json");
        assert!(store.is_empty());
        assert!(store.archived().is_empty());
    }

    #[test]
    fn missing_file_yields_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = load_from_path(&dir.path().join("notes.json"));
        assert!(store.is_empty());
        assert!(store.archived().is_empty());
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("notes.json");

        let mut store = NoteStore::new();
        store.add(full_note());
        store.add(Note::new("second", "body"));
        store.toggle_archive(1).unwrap();
        save_to_path(&path, &store).expect("save");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    \"notes\""), "expected pretty output");

        let loaded = load_from_path(&path);
        assert_eq!(loaded, store);
    }

    #[test]
    fn save_reports_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where the file should be
        let path = dir.path().join("notes.json");
        std::fs::create_dir(&path).unwrap();
        let err = save_to_path(&path, &NoteStore::new()).unwrap_err();
        assert!(matches!(err, NoteflowError::WriteFailed { .. }));
    }
}
