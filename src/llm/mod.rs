//! Summarization backends.
//!
//! Supports:
//! - **Ollama**: local models via `/api/generate`
//! - **OpenAI**: hosted models via `/v1/chat/completions`
//!
//! Both are thin JSON clients behind the [`Summarizer`] trait; the backend
//! is picked at construction time via [`LlmBackend`], never by runtime type
//! inspection. Construction does no network I/O — auth failures surface on
//! the first request.

mod ollama;
mod openai;

pub use ollama::OllamaSummarizer;
pub use openai::OpenAiSummarizer;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;

pub(crate) const SYSTEM_PROMPT: &str = "You are an assistant that summarizes email \
conversations. When interpreting the context of the email content, use my bio to \
identify action item priorities. My bio is: ";

pub(crate) const SUMMARY_PROMPT: &str = "Create a short summary in bullet points and \
any possible action items for me of the following email. Based on my given bio, \
prioritize the action items accordingly by using either 'low', 'med' or 'high' \
qualifiers and identify the urgency and importance of the message. Always separate \
action items from the summary. The email conversation is: ";

/// Build the (system, user) prompt pair for one summarization call.
pub(crate) fn build_prompts(profile: &str, text: &str) -> (String, String) {
    (
        format!("{SYSTEM_PROMPT}{profile}"),
        format!("{SUMMARY_PROMPT}{text}"),
    )
}

/// A profile-primed text summarizer.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Install the caller's profile text; subsequent summaries are primed
    /// with it.
    fn set_profile(&self, profile: &str);

    /// Summarize one message body into bullet points plus prioritized
    /// action items.
    async fn summarize(&self, text: &str) -> Result<String, LlmError>;

    /// Reserved: action items extracted separately from the summary.
    async fn action_items(&self, _text: &str) -> Result<Vec<String>, LlmError> {
        Ok(Vec::new())
    }
}

/// Supported summarization backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama,
    OpenAi,
}

impl FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("Unknown LLM backend: {other}")),
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

/// Configuration for creating a summarizer.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub model: String,
    /// Required for OpenAI; ignored by Ollama.
    pub api_key: secrecy::SecretString,
    /// Ollama server base URL.
    pub ollama_host: String,
}

/// Create a summarizer from configuration.
pub fn create_summarizer(config: &LlmConfig) -> Result<Arc<dyn Summarizer>, LlmError> {
    match config.backend {
        LlmBackend::Ollama => {
            tracing::info!(model = %config.model, host = %config.ollama_host, "Using Ollama");
            Ok(Arc::new(OllamaSummarizer::new(
                &config.model,
                &config.ollama_host,
            )))
        }
        LlmBackend::OpenAi => {
            tracing::info!(model = %config.model, "Using OpenAI");
            Ok(Arc::new(OpenAiSummarizer::new(
                &config.model,
                config.api_key.clone(),
            )))
        }
    }
}
