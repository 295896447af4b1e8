use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};

/// Display format for reminders, also the persisted format.
pub const REMINDER_FORMAT: &str = "%Y-%m-%d %H:%M";

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_COLOR: &str = "#fff3e0";

// ============================================================================
// Reminder
// ============================================================================

/// A reminder timestamp with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reminder(NaiveDateTime);

impl Reminder {
    /// Wrap a timestamp, dropping seconds and sub-second parts.
    pub fn new(at: NaiveDateTime) -> Self {
        let truncated = at
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(at);
        Self(truncated)
    }

    /// Parse `yyyy-MM-dd HH:mm`. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(raw.trim(), REMINDER_FORMAT)
            .ok()
            .map(Self::new)
    }

    pub fn at(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(REMINDER_FORMAT))
    }
}

fn serialize_reminder<S: Serializer>(
    reminder: &Option<Reminder>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match reminder {
        Some(r) => serializer.serialize_str(&r.to_string()),
        None => serializer.serialize_str(""),
    }
}

// ============================================================================
// Note
// ============================================================================

/// One note. Field order matches the legacy positional layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub title: String,
    pub content: String,
    pub color: String,
    pub tags: String,
    pub pinned: bool,
    pub archived: bool,
    #[serde(serialize_with = "serialize_reminder")]
    pub reminder: Option<Reminder>,
    pub attached_files: Vec<String>,
    pub collaborators: Vec<String>,
    pub drawing: String,
}

impl Note {
    /// New unpinned, unarchived note. A blank title becomes "Untitled".
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            title,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Individual tags, trimmed, empty entries skipped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Case-insensitive substring match on title, content and tags.
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.tags.to_lowercase().contains(needle)
    }
}

impl Default for Note {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            content: String::new(),
            color: DEFAULT_COLOR.to_string(),
            tags: String::new(),
            pinned: false,
            archived: false,
            reminder: None,
            attached_files: Vec::new(),
            collaborators: Vec::new(),
            drawing: String::new(),
        }
    }
}

// ============================================================================
// Configuration (~/.noteflow/config.json)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding notes.json and guest_users.json. Defaults to ~/.noteflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default = "default_notes_file")]
    pub notes_file: String,
    #[serde(default = "default_guest_users_file")]
    pub guest_users_file: String,
    /// Name of the JSON file mirrored to Google Drive.
    #[serde(default = "default_drive_file_name")]
    pub drive_file_name: String,
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir().unwrap_or_default().join(".noteflow"),
        }
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_dir().join(&self.notes_file)
    }

    pub fn guest_users_path(&self) -> PathBuf {
        self.data_dir().join(&self.guest_users_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            notes_file: default_notes_file(),
            guest_users_file: default_guest_users_file(),
            drive_file_name: default_drive_file_name(),
            groq: GroqConfig::default(),
            google: GoogleConfig::default(),
        }
    }
}

fn default_notes_file() -> String {
    "notes.json".to_string()
}

fn default_guest_users_file() -> String {
    "guest_users.json".to_string()
}

fn default_drive_file_name() -> String {
    "noteflow_notes.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroqConfig {
    #[serde(default = "default_groq_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Overridden by the GROQ_API_KEY environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: default_groq_base_url(),
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
            api_key: None,
        }
    }
}

fn default_groq_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_chat_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_vision_model() -> String {
    "llama-3.2-11b-vision-preview".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleConfig {
    /// Sync notes to Google Drive when signed in with Google.
    #[serde(default)]
    pub enabled: bool,
    /// OAuth client credentials file (Desktop App type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<String>,
}
