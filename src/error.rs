//! Error types for note operations
//!
//! Errors are classified by how the user recovers from them:
//! - Io: local files missing, unreadable or not writable
//! - External: network, AI service and Google API failures
//! - Usage: bad index, invalid input, capture already running
//!
//! Nothing here is fatal. Every variant renders to a message for the
//! status area and leaves the application continuable.

use std::path::PathBuf;
use thiserror::Error;

use crate::google_api::GoogleApiError;
use crate::intelligence::AiError;

#[derive(Debug, Error)]
pub enum NoteflowError {
    // Io
    #[error("IO error: {0}")]
    Io(String),

    #[error("Could not write {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    // External
    #[error("Network unreachable")]
    Unreachable,

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    #[error("Google API error: {0}")]
    Google(#[from] GoogleApiError),

    // Usage
    #[error("No note at position {index} (collection has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0}")]
    Validation(String),

    #[error("A recording is already in progress")]
    CaptureInProgress,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    External,
    Usage,
}

impl NoteflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NoteflowError::Io(_) | NoteflowError::WriteFailed { .. } => ErrorKind::Io,
            NoteflowError::Unreachable | NoteflowError::Ai(_) | NoteflowError::Google(_) => {
                ErrorKind::External
            }
            NoteflowError::IndexOutOfRange { .. }
            | NoteflowError::Validation(_)
            | NoteflowError::CaptureInProgress
            | NoteflowError::Configuration(_) => ErrorKind::Usage,
        }
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            NoteflowError::Io(_) | NoteflowError::WriteFailed { .. } => {
                "Check file permissions and disk space."
            }
            NoteflowError::Unreachable => "Check your internet connection and try again.",
            NoteflowError::Ai(_) => "The AI service did not answer. Try again.",
            NoteflowError::Google(GoogleApiError::AuthExpired) => {
                "Sign in with Google again to refresh access."
            }
            NoteflowError::Google(_) => "Google Drive is unavailable. Try again later.",
            NoteflowError::IndexOutOfRange { .. } => "Refresh the list and pick a note again.",
            NoteflowError::Validation(_) => "Correct the highlighted input.",
            NoteflowError::CaptureInProgress => "Stop the current recording first.",
            NoteflowError::Configuration(_) => "Check your configuration in ~/.noteflow/config.json",
        }
    }

    /// Message shown in the status area.
    pub fn status_line(&self) -> String {
        format!("{} {}", self, self.recovery_suggestion())
    }
}

impl From<std::io::Error> for NoteflowError {
    fn from(err: std::io::Error) -> Self {
        NoteflowError::Io(err.to_string())
    }
}
