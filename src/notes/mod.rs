//! Notes: record store, checklist section and notes.json codec.

pub mod checklist;
pub mod codec;
pub mod store;

pub use checklist::ChecklistItem;
pub use store::{NoteDraft, NoteStore};
