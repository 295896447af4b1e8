//! What a finished transcript asks for: a note, a task, or nothing.

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::notes::checklist::{self, ChecklistItem};
use crate::notes::NoteStore;
use crate::types::{Note, REMINDER_FORMAT};

pub const SPOKEN_NOTE_TITLE: &str = "Spoken Note";

fn re_note_command() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(make a note|add a note)").unwrap())
}

fn re_task() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(I have to|I need to|I must)\s+(.+?)\s+(by|on|in|within)\s+(.+)").unwrap()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Priority from a spoken time frame such as "tomorrow" or "this month".
    pub fn from_time_frame(time_frame: &str) -> Self {
        let tf = time_frame.to_lowercase();
        if tf.contains("today") {
            Priority::VeryHigh
        } else if tf.contains("tomorrow") || tf.contains("in a few days") {
            Priority::High
        } else if tf.contains("this month") {
            Priority::Low
        } else {
            Priority::Medium
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::VeryHigh => "Very High",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpokenIntent {
    /// "make a note ..." with the command phrase removed.
    Note(String),
    /// A note command with nothing after it.
    EmptyNote,
    Task {
        description: String,
        time_frame: String,
        full_text: String,
    },
    /// Anything else is kept verbatim as a note.
    Plain(String),
}

pub fn classify(text: &str) -> SpokenIntent {
    let lower = text.to_lowercase();
    if lower.contains("make a note") || lower.contains("add a note") {
        let content = re_note_command().replace_all(text, "").trim().to_string();
        return if content.is_empty() {
            SpokenIntent::EmptyNote
        } else {
            SpokenIntent::Note(content)
        };
    }

    if let Some(caps) = re_task().captures(text) {
        return SpokenIntent::Task {
            description: caps[2].trim().to_string(),
            time_frame: caps[4].trim().to_lowercase(),
            full_text: text.to_string(),
        };
    }

    SpokenIntent::Plain(text.to_string())
}

fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Build the note for a spoken task.
pub fn task_note(description: &str, time_frame: &str, full_text: &str, created: NaiveDateTime) -> Note {
    let task_name = capitalize_words(description);
    let priority = Priority::from_time_frame(time_frame);
    let body = format!(
        "Task: {}\nDescription: {}\nCreated: {}\nPriority: {}",
        task_name,
        full_text,
        created.format(REMINDER_FORMAT),
        priority
    );
    let items = [ChecklistItem::new(format!("Complete {}", task_name), false)];
    Note::new(format!("Task: {}", task_name), checklist::compose(&body, &items))
        .with_tags(format!("task, {}", priority.label().to_lowercase()))
}

/// Route a transcript into the store and return the status message.
pub fn apply_transcript(store: &mut NoteStore, text: &str, now: NaiveDateTime) -> String {
    match classify(text) {
        SpokenIntent::EmptyNote => "No note content provided.".to_string(),
        SpokenIntent::Note(content) | SpokenIntent::Plain(content) => {
            if content.trim().is_empty() {
                return "No content recorded.".to_string();
            }
            store.add(Note::new(SPOKEN_NOTE_TITLE, content));
            "Spoken note saved.".to_string()
        }
        SpokenIntent::Task {
            description,
            time_frame,
            full_text,
        } => {
            let note = task_note(&description, &time_frame, &full_text, now);
            let priority = Priority::from_time_frame(&time_frame);
            let name = capitalize_words(&description);
            store.add(note);
            log::info!("Created spoken task '{}' ({})", name, priority);
            format!("Task '{}' created with priority '{}'.", name, priority)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn note_command_is_stripped() {
        assert_eq!(
            classify("Make a note buy oat milk"),
            SpokenIntent::Note("buy oat milk".to_string())
        );
        assert_eq!(classify("  ADD A NOTE "), SpokenIntent::EmptyNote);
    }

    #[test]
    fn task_phrases_are_extracted() {
        assert_eq!(
            classify("I need to file the expense report by Friday"),
            SpokenIntent::Task {
                description: "file the expense report".to_string(),
                time_frame: "friday".to_string(),
                full_text: "I need to file the expense report by Friday".to_string(),
            }
        );
        assert!(matches!(
            classify("The weather is nice"),
            SpokenIntent::Plain(_)
        ));
    }

    #[test]
    fn priority_from_time_frame() {
        assert_eq!(Priority::from_time_frame("end of today"), Priority::VeryHigh);
        assert_eq!(Priority::from_time_frame("tomorrow"), Priority::High);
        assert_eq!(Priority::from_time_frame("a few days"), Priority::Medium);
        assert_eq!(Priority::from_time_frame("this month"), Priority::Low);
        assert_eq!(Priority::from_time_frame("next year"), Priority::Medium);
    }

    #[test]
    fn task_note_layout() {
        let note = task_note("call the BANK", "today", "I must call the bank by today", noon());
        assert_eq!(note.title, "Task: Call The Bank");
        assert_eq!(note.tags, "task, very high");
        assert!(note.content.starts_with(
            "Task: Call The Bank\nDescription: I must call the bank by today\nCreated: 2025-06-02 12:00\nPriority: Very High"
        ));

        let (_, items) = checklist::split(&note.content);
        assert_eq!(items, vec![ChecklistItem::new("Complete Call The Bank", false)]);
    }

    #[test]
    fn apply_adds_to_store() {
        let mut store = NoteStore::new();
        assert_eq!(
            apply_transcript(&mut store, "Groceries are running low.", noon()),
            "Spoken note saved."
        );
        assert_eq!(
            apply_transcript(&mut store, "I have to renew my passport by tomorrow", noon()),
            "Task 'Renew My Passport' created with priority 'High'."
        );
        assert_eq!(
            apply_transcript(&mut store, "make a note", noon()),
            "No note content provided."
        );

        assert_eq!(store.len(), 2);
        assert_eq!(store.active()[0].title, SPOKEN_NOTE_TITLE);
        assert_eq!(store.active()[1].tags, "task, high");
    }
}
