//! Configuration, built from environment variables.

use std::str::FromStr;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::fetch::GmailConfig;
use crate::llm::{LlmBackend, LlmConfig};

/// Top-level runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between ingestion cycles.
    pub poll_interval_secs: u64,
    /// Upper bound on one summarization call.
    pub summarize_timeout_secs: u64,
    /// Port for the push WebSocket + dashboard server.
    pub ws_port: u16,
    /// Directory of static dashboard files served at `/`.
    pub dashboard_dir: String,
    /// The user's bio, installed into the summarizer as its profile.
    pub profile: String,
    /// Summarization backend settings.
    pub llm: LlmConfig,
    /// Mail provider settings.
    pub fetch: GmailConfig,
    /// Durable seen-store path; `None` keeps de-dup in memory.
    pub db_path: Option<String>,
    /// Desktop notifications toggle.
    pub notifications: bool,
}

impl Config {
    /// Build config from environment variables.
    ///
    /// Only `GMAIL_ACCESS_TOKEN` (always) and `OPENAI_API_KEY` (when the
    /// OpenAI backend is selected) are required; everything else has a
    /// default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_secs = env_parse("DIGEST_POLL_INTERVAL_SECS", 600);
        let summarize_timeout_secs = env_parse("DIGEST_SUMMARIZE_TIMEOUT_SECS", 300);
        let ws_port = env_parse("DIGEST_WS_PORT", 8080);
        let dashboard_dir =
            std::env::var("DIGEST_DASHBOARD_DIR").unwrap_or_else(|_| "./dashboard".to_string());
        let profile = std::env::var("DIGEST_PROFILE").unwrap_or_default();

        let backend_raw = std::env::var("DIGEST_LLM").unwrap_or_else(|_| "ollama".to_string());
        let backend =
            LlmBackend::from_str(&backend_raw).map_err(|message| ConfigError::InvalidValue {
                key: "DIGEST_LLM".to_string(),
                message,
            })?;

        let model = std::env::var("DIGEST_MODEL").unwrap_or_else(|_| match backend {
            LlmBackend::Ollama => "zephyr".to_string(),
            LlmBackend::OpenAi => "gpt-4o-mini".to_string(),
        });

        let api_key = match backend {
            LlmBackend::OpenAi => SecretString::from(
                std::env::var("OPENAI_API_KEY")
                    .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?,
            ),
            LlmBackend::Ollama => SecretString::from(String::new()),
        };

        let ollama_host =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());

        let access_token = SecretString::from(
            std::env::var("GMAIL_ACCESS_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".to_string()))?,
        );
        let mut fetch = GmailConfig::new(access_token);
        fetch.max_results = env_parse("GMAIL_MAX_RESULTS", fetch.max_results);
        fetch.recency_minutes = env_parse("GMAIL_RECENCY_MINUTES", fetch.recency_minutes);

        let db_path = std::env::var("DIGEST_DB_PATH").ok();
        let notifications = std::env::var("DIGEST_NOTIFICATIONS")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        Ok(Self {
            poll_interval_secs,
            summarize_timeout_secs,
            ws_port,
            dashboard_dir,
            profile,
            llm: LlmConfig {
                backend,
                model,
                api_key,
                ollama_host,
            },
            fetch,
            db_path,
            notifications,
        })
    }
}

/// Parse an env var, falling back to the default when unset or malformed.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_bool(s: &str) -> bool {
    !matches!(s.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
