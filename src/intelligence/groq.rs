//! Groq chat-completions client (OpenAI-compatible API).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{AiAssist, AiError};
use crate::types::GroqConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct GroqClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    chat_model: String,
    vision_model: String,
}

impl GroqClient {
    /// Build from configuration. `GROQ_API_KEY` wins over the config file.
    pub fn from_config(config: &GroqConfig) -> Result<Self, AiError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .or_else(|| config.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            chat_model: config.chat_model.clone(),
            vision_model: config.vision_model.clone(),
        })
    }

    async fn send(&self, body: serde_json::Value) -> Result<String, AiError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        first_choice_text(parsed)
    }
}

fn first_choice_text(resp: ChatResponse) -> Result<String, AiError> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| AiError::MalformedResponse("no choices in response".to_string()))
}

fn text_request(model: &str, system_prompt: &str, user_text: &str, max_tokens: u32) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_text }
        ],
        "max_tokens": max_tokens
    })
}

fn vision_request(model: &str, prompt: &str, image_data_url: &str, max_tokens: u32) -> serde_json::Value {
    json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": image_data_url } }
            ]
        }],
        "max_tokens": max_tokens
    })
}

#[async_trait]
impl AiAssist for GroqClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_output_tokens: u32,
    ) -> Result<String, AiError> {
        self.send(text_request(
            &self.chat_model,
            system_prompt,
            user_text,
            max_output_tokens,
        ))
        .await
    }

    async fn describe_image(
        &self,
        prompt: &str,
        image_data_url: &str,
        max_output_tokens: u32,
    ) -> Result<String, AiError> {
        self.send(vision_request(
            &self.vision_model,
            prompt,
            image_data_url,
            max_output_tokens,
        ))
        .await
    }
}
