//! Transcript cleanup: sentence punctuation and capitalization.

const QUESTION_WORDS: &[&str] = &[
    "how", "where", "what", "who", "when", "why", "which", "whose", "whom", "can you", "what's",
    "where's", "how's",
];

const TERMINALS: &[char] = &['.', '?', '!'];

/// Lowercase, trim, end with `?` for questions and `.` otherwise, then
/// capitalize the first letter.
pub fn normalize_transcript(text: &str) -> String {
    let lowered = text.to_lowercase();
    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        return "No speech detected.".to_string();
    }

    let is_question = QUESTION_WORDS
        .iter()
        .any(|word| trimmed.contains(&format!("{} ", word)));
    let terminal = if is_question { '?' } else { '.' };

    let stem = trimmed.strip_suffix(TERMINALS).unwrap_or(trimmed);
    let sentence = format!("{}{}", stem, terminal);
    capitalize_first(&sentence)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
