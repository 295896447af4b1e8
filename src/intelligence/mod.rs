//! AI assist: chat completions for responses, tags, summaries and OCR.
//!
//! `AiAssist` is the seam to the language-model service. The helpers in
//! `assist` turn every outcome, failures included, into display text.

pub mod assist;
pub mod groq;

use async_trait::async_trait;

pub use groq::GroqClient;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("No API key configured")]
    MissingApiKey,
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait AiAssist: Send + Sync {
    /// Text completion.
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_output_tokens: u32,
    ) -> Result<String, AiError>;

    /// Vision completion over one image given as a data URL.
    async fn describe_image(
        &self,
        prompt: &str,
        image_data_url: &str,
        max_output_tokens: u32,
    ) -> Result<String, AiError>;
}
