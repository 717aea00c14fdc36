//! Gmail REST provider — lists unread messages and fetches their payloads.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{MailFetch, RawMessage};
use crate::error::FetchError;

const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

/// Gmail provider configuration.
#[derive(Debug, Clone)]
pub struct GmailConfig {
    /// OAuth bearer token with at least the readonly scope.
    pub access_token: SecretString,
    /// Upper bound on messages listed per fetch.
    pub max_results: u32,
    /// Messages older than this are dropped provider-side.
    pub recency_minutes: i64,
    /// API base URL, overridable for tests.
    pub api_base: String,
}

impl GmailConfig {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            access_token,
            max_results: 40,
            recency_minutes: 30,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDetail {
    /// Epoch milliseconds, serialized as a string by the API.
    #[serde(default)]
    internal_date: String,
    payload: Payload,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Body,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct Body {
    #[serde(default)]
    size: u64,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    body: Body,
}

/// True when `internal_date_ms` falls within the recency window ending at
/// `now_ms`.
fn is_recent(internal_date_ms: i64, now_ms: i64, recency_minutes: i64) -> bool {
    now_ms - internal_date_ms <= recency_minutes * 60_000
}

/// Flatten one message detail into raw messages.
///
/// A populated top-level body yields a single message; otherwise each part's
/// body becomes its own message under the same headers, mirroring how the
/// API splits multipart payloads.
fn collect_raw(payload: Payload) -> Vec<RawMessage> {
    let headers: HashMap<String, String> = payload
        .headers
        .into_iter()
        .map(|h| (h.name, h.value))
        .collect();

    if payload.body.size > 0 {
        let body = payload.body.data.unwrap_or_default();
        return vec![RawMessage { headers, body }];
    }

    payload
        .parts
        .into_iter()
        .map(|part| RawMessage {
            headers: headers.clone(),
            body: part.body.data.unwrap_or_default(),
        })
        .collect()
}

/// Unread-mail fetcher over the Gmail REST API.
pub struct GmailFetcher {
    client: reqwest::Client,
    config: GmailConfig,
}

impl GmailFetcher {
    pub fn new(config: GmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::AuthFailed);
        }

        let response = response
            .error_for_status()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MailFetch for GmailFetcher {
    async fn fetch(&self) -> Result<Vec<RawMessage>, FetchError> {
        let list_url = format!(
            "{}/gmail/v1/users/me/messages?q=is:unread&maxResults={}",
            self.config.api_base, self.config.max_results
        );
        let list: ListResponse = self.get_json(&list_url).await?;
        debug!(listed = list.messages.len(), "Listed unread messages");

        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut batch = Vec::new();

        for message_ref in list.messages {
            let detail_url = format!(
                "{}/gmail/v1/users/me/messages/{}?format=full",
                self.config.api_base, message_ref.id
            );
            // One undecipherable message must not sink the batch.
            let detail: MessageDetail = match self.get_json(&detail_url).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(id = %message_ref.id, error = %e, "Skipping message");
                    continue;
                }
            };

            let internal_date_ms = detail.internal_date.parse::<i64>().unwrap_or(0);
            if !is_recent(internal_date_ms, now_ms, self.config.recency_minutes) {
                continue;
            }

            batch.extend(collect_raw(detail.payload));
        }

        Ok(batch)
    }
}
