//! Mail retrieval collaborators.
//!
//! The pipeline consumes providers behind the [`MailFetch`] trait and never
//! looks at authentication, pagination, or account quirks. Providers may
//! apply their own recency/volume filtering; the core does not re-filter.

mod gmail;

pub use gmail::{GmailConfig, GmailFetcher};

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::FetchError;

/// A raw message as returned by a provider: unparsed headers plus a
/// base64 transport-encoded body. Batches carry no ordering guarantee.
#[derive(Debug, Clone, Default)]
pub struct RawMessage {
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RawMessage {
    /// Header lookup; a missing header reads as the empty string.
    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name).map(String::as_str).unwrap_or("")
    }
}

/// A source of recent unread messages.
#[async_trait]
pub trait MailFetch: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawMessage>, FetchError>;
}
