//! Checklist section embedded in a note body.
//!
//! A note's content may end with a `Checklist:` marker followed by one
//! item per line, `☑ text` when checked and `☐ text` otherwise.

pub const CHECKLIST_MARKER: &str = "Checklist:";
const CHECKED: char = '☑';
const UNCHECKED: char = '☐';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub checked: bool,
    pub text: String,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            text: text.into(),
        }
    }

    fn render(&self) -> String {
        let mark = if self.checked { CHECKED } else { UNCHECKED };
        format!("{} {}", mark, self.text)
    }

    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let mut chars = line.chars();
        let checked = match chars.next() {
            Some(CHECKED) => true,
            Some(UNCHECKED) => false,
            // Hand-typed line without a box
            _ => return Some(Self::new(line, false)),
        };
        Some(Self::new(chars.as_str().trim(), checked))
    }
}

/// Split content into the body text and its checklist items.
pub fn split(content: &str) -> (&str, Vec<ChecklistItem>) {
    match content.split_once(CHECKLIST_MARKER) {
        Some((body, list)) => {
            let items = list.lines().filter_map(ChecklistItem::parse).collect();
            (body.trim(), items)
        }
        None => (content, Vec::new()),
    }
}

/// Append a checklist section to `body`. No items, no section.
pub fn compose(body: &str, items: &[ChecklistItem]) -> String {
    if items.is_empty() {
        return body.to_string();
    }
    let mut content = String::from(body);
    content.push_str("\n\n");
    content.push_str(CHECKLIST_MARKER);
    content.push('\n');
    for item in items {
        content.push_str(&item.render());
        content.push('\n');
    }
    content
}
