//! Conversation assembly — groups a raw batch into per-subject threads.
//!
//! Pure data shaping: no summarization and no network I/O happens here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fetch::RawMessage;
use crate::pipeline::normalize::normalize;

/// A group of messages sharing an exact subject string within one cycle.
///
/// Grouping is by the literal `Subject` header value: case-sensitive, no
/// reply-prefix ("Re:", "Fwd:") normalization. Conversations are rebuilt
/// from scratch every cycle — nothing persists across cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub subject: String,
    /// Messages in the order they appeared in the source batch. The batch
    /// carries no ordering guarantee, so this is not chronological.
    pub messages: Vec<Message>,
}

/// A decoded message inside a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Sender, verbatim from the `From` header (empty if absent).
    pub from: String,
    /// Provider-supplied date string, retained verbatim and never parsed.
    pub date: String,
    /// Normalized plain-text body. Always non-empty — empty bodies are
    /// dropped during assembly.
    pub body: String,
}

/// Group a fetched batch into conversations by exact subject.
///
/// Messages whose normalized body comes out empty are dropped: they have
/// nothing to summarize and must never reach a subscriber. A missing
/// `Subject` header lands the message in the empty-string conversation.
/// Conversation order across the output is unspecified (unordered-key
/// grouping); message order within a conversation follows the batch.
pub fn assemble(batch: &[RawMessage]) -> Vec<Conversation> {
    let mut groups: HashMap<String, Vec<&RawMessage>> = HashMap::new();
    for raw in batch {
        groups
            .entry(raw.header("Subject").to_string())
            .or_default()
            .push(raw);
    }

    groups
        .into_iter()
        .map(|(subject, raws)| {
            let messages = raws
                .into_iter()
                .filter_map(|raw| {
                    let body = normalize(&raw.body);
                    if body.is_empty() {
                        return None;
                    }
                    Some(Message {
                        from: raw.header("From").to_string(),
                        date: raw.header("Date").to_string(),
                        body,
                    })
                })
                .collect();
            Conversation { subject, messages }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    fn raw(subject: Option<&str>, from: &str, date: &str, html: &str) -> RawMessage {
        let mut headers = HashMap::new();
        if let Some(subject) = subject {
            headers.insert("Subject".to_string(), subject.to_string());
        }
        headers.insert("From".to_string(), from.to_string());
        headers.insert("Date".to_string(), date.to_string());
        RawMessage {
            headers,
            body: STANDARD.encode(html),
        }
    }

    fn find<'a>(conversations: &'a [Conversation], subject: &str) -> &'a Conversation {
        conversations
            .iter()
            .find(|c| c.subject == subject)
            .unwrap_or_else(|| panic!("no conversation with subject {subject:?}"))
    }

    #[test]
    fn groups_by_exact_subject() {
        let batch = vec![
            raw(
                Some("Standup"),
                "alice@example.com",
                "Mon, 1 Apr 2024 09:00:00 +0000",
                "<html><body><style>p { margin: 0; }</style><p>notes from today</p></body></html>",
            ),
            raw(
                Some("1:1"),
                "bob@example.com",
                "Mon, 1 Apr 2024 09:05:00 +0000",
                "<p>agenda</p>",
            ),
            raw(
                Some("Standup"),
                "carol@example.com",
                "Mon, 1 Apr 2024 09:10:00 +0000",
                "<p>blocked on review</p>",
            ),
        ];

        let conversations = assemble(&batch);
        assert_eq!(conversations.len(), 2);

        let standup = find(&conversations, "Standup");
        assert_eq!(standup.messages.len(), 2);
        // Batch order preserved within the conversation.
        assert_eq!(standup.messages[0].from, "alice@example.com");
        assert_eq!(standup.messages[1].from, "carol@example.com");
        // Style-block content never reaches the extracted text.
        assert_eq!(standup.messages[0].body, "notes from today");

        let one_on_one = find(&conversations, "1:1");
        assert_eq!(one_on_one.messages.len(), 1);
        assert_eq!(one_on_one.messages[0].body, "agenda");
    }

    #[test]
    fn missing_subject_is_empty_string() {
        let batch = vec![
            raw(None, "a@example.com", "d1", "<p>one</p>"),
            raw(None, "b@example.com", "d2", "<p>two</p>"),
        ];

        let conversations = assemble(&batch);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].subject, "");
        assert_eq!(conversations[0].messages.len(), 2);
    }

    #[test]
    fn reply_prefix_is_not_normalized() {
        let batch = vec![
            raw(Some("Budget"), "a@example.com", "d1", "<p>draft</p>"),
            raw(Some("Re: Budget"), "b@example.com", "d2", "<p>reply</p>"),
        ];

        let conversations = assemble(&batch);
        assert_eq!(conversations.len(), 2);
    }

    #[test]
    fn empty_body_is_dropped() {
        let batch = vec![
            raw(Some("Standup"), "a@example.com", "d1", "<p>kept</p>"),
            raw(Some("Standup"), "b@example.com", "d2", "<style>.x{}</style>"),
        ];

        let conversations = assemble(&batch);
        let standup = find(&conversations, "Standup");
        assert_eq!(standup.messages.len(), 1);
        assert_eq!(standup.messages[0].from, "a@example.com");
    }

    #[test]
    fn undecodable_body_is_dropped() {
        let mut bad = raw(Some("Standup"), "a@example.com", "d1", "<p>ignored</p>");
        bad.body = "not base64 at all".to_string();

        let conversations = assemble(&[bad]);
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].messages.is_empty());
    }

    #[test]
    fn headers_default_to_empty_strings() {
        let message = RawMessage {
            headers: HashMap::new(),
            body: STANDARD.encode("<p>body</p>"),
        };

        let conversations = assemble(&[message]);
        assert_eq!(conversations[0].subject, "");
        assert_eq!(conversations[0].messages[0].from, "");
        assert_eq!(conversations[0].messages[0].date, "");
    }
}
