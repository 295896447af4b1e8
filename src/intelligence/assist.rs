//! Prompt catalogue. Every helper returns display text; service errors
//! never escape.

use super::AiAssist;

const NOTE_ASSISTANT_PROMPT: &str = "You are a helpful AI assistant for taking notes.";
const TAGGER_PROMPT: &str =
    "You are an AI that categorizes notes. Suggest 1-3 relevant tags for the given note content.";
const ORGANIZER_PROMPT: &str = "You are an AI that organizes notes and generates related ideas. First, summarize or reformat the note for clarity, then suggest 2-3 related ideas.";
const HANDWRITING_SUMMARY_PROMPT: &str =
    "You are a helpful AI assistant that summarizes handwritten notes.";
const CHAT_PROMPT: &str = "You are a helpful AI assistant.";

const IDEAS_MARKER: &str = "Ideas:";

/// What a helper produced: text for the response area, plus the value to
/// apply to the editor when the call succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistReply {
    pub message: String,
    pub output: Option<String>,
}

impl AssistReply {
    fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: None,
        }
    }
}

/// Free-form response to a note.
pub async fn generate_response(ai: &dyn AiAssist, note: &str) -> AssistReply {
    if note.trim().is_empty() {
        return AssistReply::message_only("Please enter a note to generate an AI response.");
    }
    match ai.complete(NOTE_ASSISTANT_PROMPT, note, 500).await {
        Ok(text) => {
            log::info!("Generated AI response for note: {}...", preview(note));
            AssistReply {
                message: text.clone(),
                output: Some(text),
            }
        }
        Err(e) => AssistReply::message_only(format!("Error getting AI response: {}", e)),
    }
}

/// 1-3 tags for the note. `output` holds the raw tag text.
pub async fn suggest_tags(ai: &dyn AiAssist, note: &str) -> AssistReply {
    if note.trim().is_empty() {
        return AssistReply::message_only("Please enter a note to tag.");
    }
    let user = format!("Note: {}\nSuggest tags for this note.", note);
    match ai.complete(TAGGER_PROMPT, &user, 100).await {
        Ok(tags) => AssistReply {
            message: format!("Suggested Tags: {}", tags),
            output: Some(tags),
        },
        Err(e) => AssistReply::message_only(format!("Error tagging note: {}", e)),
    }
}

/// Reorganized note plus related ideas. `output` is the reorganized part
/// only, i.e. everything before "Ideas:".
pub async fn organize_ideas(ai: &dyn AiAssist, note: &str) -> AssistReply {
    if note.trim().is_empty() {
        return AssistReply::message_only("Please enter a note to organize and generate ideas.");
    }
    let user = format!(
        "Note: {}\nOrganize this note and generate related ideas.",
        note
    );
    match ai.complete(ORGANIZER_PROMPT, &user, 500).await {
        Ok(result) => {
            let body = strip_ideas(&result).to_string();
            AssistReply {
                message: result,
                output: Some(body),
            }
        }
        Err(e) => AssistReply::message_only(format!("Error organizing note: {}", e)),
    }
}

/// Short summary of OCR output.
pub async fn summarize_handwriting(ai: &dyn AiAssist, text: &str) -> AssistReply {
    if text.trim().is_empty() {
        return AssistReply::message_only("Please extract some text to summarize.");
    }
    let user = format!("Summarize the following handwritten text:\n\n{}", text);
    match ai.complete(HANDWRITING_SUMMARY_PROMPT, &user, 200).await {
        Ok(summary) => AssistReply {
            message: summary.clone(),
            output: Some(summary),
        },
        Err(e) => AssistReply::message_only(format!("Error summarizing text: {}", e)),
    }
}

/// Reply to a spoken or typed chat message.
pub async fn chat_reply(ai: &dyn AiAssist, text: &str) -> AssistReply {
    if text.trim().is_empty() {
        return AssistReply::message_only("Please enter a message.");
    }
    match ai.complete(CHAT_PROMPT, text, 500).await {
        Ok(reply) => AssistReply {
            message: reply.clone(),
            output: Some(reply),
        },
        Err(e) => AssistReply::message_only(format!("Error getting AI response: {}", e)),
    }
}

fn strip_ideas(result: &str) -> &str {
    match result.find(IDEAS_MARKER) {
        Some(pos) => result[..pos].trim(),
        None => result,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
