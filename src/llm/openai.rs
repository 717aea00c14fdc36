//! OpenAI backend — `/v1/chat/completions` client.

use std::sync::RwLock;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Summarizer, build_prompts};
use crate::error::LlmError;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Summarizer backed by the OpenAI chat completions API.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    model: String,
    api_key: SecretString,
    profile: RwLock<String>,
}

impl OpenAiSummarizer {
    pub fn new(model: &str, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.to_string(),
            api_key,
            profile: RwLock::new(String::new()),
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn set_profile(&self, profile: &str) {
        *self.profile.write().unwrap_or_else(|e| e.into_inner()) = profile.to_string();
    }

    async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let profile = self
            .profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let (system, user) = build_prompts(&profile, text);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content)
    }
}
