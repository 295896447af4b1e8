//! Active and archived note collections
//!
//! Indices passed to mutating operations refer to positions in the active
//! collection (or the archived one for the `_archived` variants). Display
//! order is derived with `sorted_view`, never stored.

use crate::error::NoteflowError;
use crate::notes::checklist::{self, ChecklistItem};
use crate::types::{Note, Reminder, DEFAULT_COLOR};

/// Editor contents for the "Save" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
    pub checklist: Vec<ChecklistItem>,
    pub color: String,
    pub tags: String,
    pub reminder: Option<Reminder>,
    pub attached_files: Vec<String>,
    pub collaborators: Vec<String>,
    pub drawing: String,
}

impl Default for NoteDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            checklist: Vec::new(),
            color: DEFAULT_COLOR.to_string(),
            tags: String::new(),
            reminder: None,
            attached_files: Vec::new(),
            collaborators: Vec::new(),
            drawing: String::new(),
        }
    }
}

impl NoteDraft {
    /// Load a stored note back into editor form, splitting off its checklist.
    pub fn from_note(note: &Note) -> Self {
        let (body, items) = checklist::split(&note.content);
        Self {
            title: note.title.clone(),
            body: body.to_string(),
            checklist: items,
            color: note.color.clone(),
            tags: note.tags.clone(),
            reminder: note.reminder,
            attached_files: note.attached_files.clone(),
            collaborators: note.collaborators.clone(),
            drawing: note.drawing.clone(),
        }
    }

    fn into_note(self) -> Option<Note> {
        let content = checklist::compose(&self.body, &self.checklist);
        if content.trim().is_empty() {
            return None;
        }
        let mut note = Note::new(self.title, content);
        note.color = self.color;
        note.tags = self.tags;
        note.reminder = self.reminder;
        note.attached_files = self.attached_files;
        note.collaborators = self.collaborators;
        note.drawing = self.drawing;
        Some(note)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteStore {
    active: Vec<Note>,
    archived: Vec<Note>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded collections. The collection a record was stored in
    /// decides its archived flag.
    pub fn from_collections(mut active: Vec<Note>, mut archived: Vec<Note>) -> Self {
        let mismatched = active.iter().filter(|n| n.archived).count()
            + archived.iter().filter(|n| !n.archived).count();
        if mismatched > 0 {
            log::warn!(
                "Normalized archived flag on {} note(s) to match their collection",
                mismatched
            );
        }
        active.iter_mut().for_each(|n| n.archived = false);
        archived.iter_mut().for_each(|n| n.archived = true);
        Self { active, archived }
    }

    pub fn active(&self) -> &[Note] {
        &self.active
    }

    pub fn archived(&self) -> &[Note] {
        &self.archived
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Note, NoteflowError> {
        self.active.get(index).ok_or(NoteflowError::IndexOutOfRange {
            index,
            len: self.active.len(),
        })
    }

    fn check_active(&self, index: usize) -> Result<(), NoteflowError> {
        self.get(index).map(|_| ())
    }

    /// Append a note to the active collection. Duplicates are fine.
    pub fn add(&mut self, mut note: Note) {
        note.archived = false;
        self.active.push(note);
    }

    /// Replace the note at `index`, keeping its pinned/archived flags.
    pub fn update(&mut self, index: usize, mut note: Note) -> Result<(), NoteflowError> {
        self.check_active(index)?;
        let existing = &mut self.active[index];
        note.pinned = existing.pinned;
        note.archived = existing.archived;
        *existing = note;
        Ok(())
    }

    /// Flip `pinned`. Pinned notes move to the front, unpinned to the end.
    /// Returns the new flag.
    pub fn toggle_pin(&mut self, index: usize) -> Result<bool, NoteflowError> {
        self.check_active(index)?;
        let mut note = self.active.remove(index);
        note.pinned = !note.pinned;
        let pinned = note.pinned;
        if pinned {
            self.active.insert(0, note);
        } else {
            self.active.push(note);
        }
        Ok(pinned)
    }

    /// Archive the active note at `index`.
    pub fn toggle_archive(&mut self, index: usize) -> Result<(), NoteflowError> {
        self.check_active(index)?;
        let mut note = self.active.remove(index);
        note.archived = true;
        self.archived.push(note);
        Ok(())
    }

    /// Move the archived note at `index` back to the end of the active list.
    pub fn unarchive(&mut self, index: usize) -> Result<(), NoteflowError> {
        if index >= self.archived.len() {
            return Err(NoteflowError::IndexOutOfRange {
                index,
                len: self.archived.len(),
            });
        }
        let mut note = self.archived.remove(index);
        note.archived = false;
        self.active.push(note);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Note, NoteflowError> {
        self.check_active(index)?;
        Ok(self.active.remove(index))
    }

    pub fn delete_archived(&mut self, index: usize) -> Result<Note, NoteflowError> {
        if index >= self.archived.len() {
            return Err(NoteflowError::IndexOutOfRange {
                index,
                len: self.archived.len(),
            });
        }
        Ok(self.archived.remove(index))
    }

    pub fn edit_tags(
        &mut self,
        index: usize,
        new_tags: impl Into<String>,
    ) -> Result<(), NoteflowError> {
        self.check_active(index)?;
        self.active[index].tags = new_tags.into();
        Ok(())
    }

    /// Case-insensitive match over title, content and tags of active notes.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Note> + 'a {
        let needle = query.to_lowercase();
        self.active
            .iter()
            .filter(move |n| !n.archived && n.matches_lowercase(&needle))
    }

    /// Search hits paired with their 1-based row in `sorted_view`, so a
    /// hit's number can be passed straight to a row command.
    pub fn search_rows<'a>(&'a self, query: &str) -> Vec<(usize, &'a Note)> {
        let needle = query.to_lowercase();
        self.sorted_view()
            .into_iter()
            .enumerate()
            .filter(|(_, n)| !n.archived && n.matches_lowercase(&needle))
            .map(|(i, n)| (i + 1, n))
            .collect()
    }

    /// Active notes, pinned first, otherwise in stored order.
    pub fn sorted_view(&self) -> Vec<&Note> {
        self.sorted_indices()
            .into_iter()
            .map(|i| &self.active[i])
            .collect()
    }

    /// Store indices in display order, so a row picked from `sorted_view`
    /// maps back to the index the mutating operations expect.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.active.len()).collect();
        // sort_by_key is stable
        indices.sort_by_key(|&i| !self.active[i].pinned);
        indices
    }

    /// The "Save" action. Updates `current` when set, else appends.
    /// Returns the index written, or `None` when the draft had no content.
    pub fn save_note(
        &mut self,
        draft: NoteDraft,
        current: Option<usize>,
    ) -> Result<Option<usize>, NoteflowError> {
        let Some(note) = draft.into_note() else {
            return Ok(None);
        };
        match current {
            Some(index) => {
                self.update(index, note)?;
                Ok(Some(index))
            }
            None => {
                self.add(note);
                Ok(Some(self.active.len() - 1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str) -> Note {
        Note::new(title, format!("{} body", title))
    }

    fn titles<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<&'a str> {
        notes.into_iter().map(|n| n.title.as_str()).collect()
    }

    fn store_of(names: &[&str]) -> NoteStore {
        let mut store = NoteStore::new();
        for name in names {
            store.add(note(name));
        }
        store
    }

    #[test]
    fn add_allows_duplicates() {
        let store = store_of(&["same", "same"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn update_keeps_pinned_and_archived_flags() {
        let mut store = store_of(&["a"]);
        store.toggle_pin(0).unwrap();

        let mut edited = Note::new("a2", "new body");
        edited.pinned = false;
        store.update(0, edited).unwrap();

        let stored = store.get(0).unwrap();
        assert_eq!(stored.title, "a2");
        assert!(stored.pinned);
        assert!(!stored.archived);
    }

    #[test]
    fn update_out_of_range_is_error() {
        let mut store = store_of(&["a"]);
        let err = store.update(5, note("x")).unwrap_err();
        assert!(matches!(err, NoteflowError::IndexOutOfRange { index: 5, len: 1 }));
    }

    #[test]
    fn toggle_pin_moves_to_front_then_end() {
        let mut store = store_of(&["a", "b", "c"]);
        assert!(store.toggle_pin(2).unwrap());
        assert_eq!(titles(store.active()), vec!["c", "a", "b"]);

        assert!(!store.toggle_pin(0).unwrap());
        assert_eq!(titles(store.active()), vec!["a", "b", "c"]);
    }

    #[test]
    fn toggle_pin_out_of_range_leaves_store_unchanged() {
        let mut store = store_of(&["a", "b"]);
        let before = store.clone();
        assert!(store.toggle_pin(2).is_err());
        assert_eq!(store, before);
    }

    #[test]
    fn sorted_view_is_stable_pinned_first() {
        let mut store = store_of(&["a", "b", "c", "d"]);
        store.toggle_pin(1).unwrap(); // b a c d
        store.toggle_pin(3).unwrap(); // d b a c
        // Unpinned notes keep their relative order, pinned ones theirs.
        assert_eq!(titles(store.sorted_view()), vec!["d", "b", "a", "c"]);

        store.toggle_pin(3).unwrap(); // pin c: c d b a
        let view = titles(store.sorted_view());
        assert_eq!(view, vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn sorted_view_keeps_order_within_partitions_without_moving() {
        let mut store = NoteStore::new();
        for (title, pinned) in [("a", false), ("b", true), ("c", false), ("d", true)] {
            let mut n = note(title);
            n.pinned = pinned;
            store.active.push(n);
        }
        assert_eq!(titles(store.sorted_view()), vec!["b", "d", "a", "c"]);
        assert_eq!(store.sorted_indices(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn toggle_archive_moves_between_collections() {
        let mut store = store_of(&["R0", "R1"]);
        store.toggle_archive(0).unwrap();

        assert_eq!(titles(store.active()), vec!["R1"]);
        assert_eq!(titles(store.archived()), vec!["R0"]);
        assert!(store.archived()[0].archived);

        store.unarchive(0).unwrap();
        assert_eq!(titles(store.active()), vec!["R1", "R0"]);
        assert!(store.archived().is_empty());
        assert!(!store.active()[1].archived);
    }

    #[test]
    fn archived_note_lives_in_exactly_one_collection() {
        let mut store = store_of(&["a", "b", "c"]);
        store.toggle_archive(1).unwrap();
        let in_active = store.active().iter().filter(|n| n.title == "b").count();
        let in_archive = store.archived().iter().filter(|n| n.title == "b").count();
        assert_eq!(in_active + in_archive, 1);
        assert_eq!(in_archive, 1);
    }

    #[test]
    fn delete_only_reaches_active() {
        let mut store = store_of(&["a", "b"]);
        store.toggle_archive(0).unwrap();
        let removed = store.delete(0).unwrap();
        assert_eq!(removed.title, "b");
        assert!(store.is_empty());
        assert_eq!(store.archived().len(), 1);

        assert!(store.delete(0).is_err());
        store.delete_archived(0).unwrap();
        assert!(store.archived().is_empty());
    }

    #[test]
    fn edit_tags_only_touches_tags() {
        let mut store = store_of(&["a"]);
        store.edit_tags(0, "work, urgent").unwrap();
        let n = store.get(0).unwrap();
        assert_eq!(n.tags, "work, urgent");
        assert_eq!(n.content, "a body");
    }

    #[test]
    fn search_is_case_insensitive_over_title_content_tags() {
        let mut store = NoteStore::new();
        store.add(Note::new("Shopping", "milk"));
        store.add(Note::new("Call", "Dentist on MONDAY"));
        store.add(Note::new("Misc", "x").with_tags("Errands"));

        assert_eq!(titles(store.search("shop")), vec!["Shopping"]);
        assert_eq!(titles(store.search("monday")), vec!["Call"]);
        assert_eq!(titles(store.search("errand")), vec!["Misc"]);
        assert_eq!(store.search("").count(), 3);
    }

    #[test]
    fn search_rows_use_display_positions() {
        let mut store = NoteStore::new();
        store.add(Note::new("Alpha", "x"));
        store.add(Note::new("Beta milk", "x"));
        store.add(Note::new("Gamma milk", "x"));
        store.toggle_pin(2).unwrap();

        // Display: Gamma milk, Alpha, Beta milk
        let rows: Vec<(usize, &str)> = store
            .search_rows("MILK")
            .into_iter()
            .map(|(row, n)| (row, n.title.as_str()))
            .collect();
        assert_eq!(rows, vec![(1, "Gamma milk"), (3, "Beta milk")]);
        assert!(store.search_rows("nothing").is_empty());
    }

    #[test]
    fn search_never_returns_archived() {
        let mut store = store_of(&["secret plan", "other"]);
        store.toggle_archive(0).unwrap();
        assert_eq!(store.search("secret").count(), 0);

        // A flagged record that slipped into the active list is still hidden.
        let mut stray = note("secret stray");
        stray.archived = true;
        store.active.push(stray);
        assert_eq!(store.search("secret").count(), 0);
    }

    #[test]
    fn from_collections_normalizes_flags() {
        let mut flagged = note("x");
        flagged.archived = true;
        let store = NoteStore::from_collections(vec![note("a"), flagged], vec![note("b")]);
        assert_eq!(titles(store.active()), vec!["a", "x"]);
        assert!(store.active().iter().all(|n| !n.archived));
        assert_eq!(titles(store.archived()), vec!["b"]);
        assert!(store.archived()[0].archived);
    }

    #[test]
    fn save_note_appends_and_updates() {
        let mut store = NoteStore::new();
        let draft = NoteDraft {
            title: " ".into(),
            body: "Pack for trip".into(),
            checklist: vec![ChecklistItem::new("passport", false)],
            ..NoteDraft::default()
        };
        assert_eq!(store.save_note(draft, None).unwrap(), Some(0));
        let saved = store.get(0).unwrap().clone();
        assert_eq!(saved.title, "Untitled");
        assert_eq!(saved.content, "Pack for trip\n\nChecklist:\n☐ passport\n");

        store.toggle_pin(0).unwrap();
        let mut reopened = NoteDraft::from_note(store.get(0).unwrap());
        assert_eq!(reopened.body, "Pack for trip");
        reopened.checklist[0].checked = true;
        store.save_note(reopened, Some(0)).unwrap();
        let updated = store.get(0).unwrap();
        assert!(updated.pinned);
        assert!(updated.content.contains("☑ passport"));
    }

    #[test]
    fn save_note_skips_blank_content() {
        let mut store = NoteStore::new();
        let draft = NoteDraft {
            title: "Empty".into(),
            body: "   ".into(),
            ..NoteDraft::default()
        };
        assert_eq!(store.save_note(draft, None).unwrap(), None);
        assert!(store.is_empty());
    }
}
