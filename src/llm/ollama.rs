//! Ollama backend — non-streaming `/api/generate` client.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Summarizer, build_prompts};
use crate::error::LlmError;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Summarizer backed by a local Ollama server.
pub struct OllamaSummarizer {
    client: reqwest::Client,
    model: String,
    host: String,
    profile: RwLock<String>,
}

impl OllamaSummarizer {
    pub fn new(model: &str, host: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.to_string(),
            host: host.trim_end_matches('/').to_string(),
            profile: RwLock::new(String::new()),
        }
    }

    fn error(&self, reason: impl Into<String>) -> LlmError {
        LlmError::RequestFailed {
            provider: "ollama".to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn set_profile(&self, profile: &str) {
        *self.profile.write().unwrap_or_else(|e| e.into_inner()) = profile.to_string();
    }

    async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        let profile = self
            .profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let (system, prompt) = build_prompts(&profile, text);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            system: &system,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.error(e.to_string()))?
            .error_for_status()
            .map_err(|e| self.error(e.to_string()))?;

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: "ollama".to_string(),
                    reason: e.to_string(),
                })?;

        Ok(body.response)
    }
}
