//! Fan-out hub — per-subscriber bounded mailboxes with non-blocking publish.

pub mod ws;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

/// Each subscriber buffers at most one undelivered update. A publish into a
/// full mailbox drops the NEW item for that subscriber, so a slow consumer
/// keeps the earlier update and misses later ones rather than stalling the
/// publisher.
pub const MAILBOX_CAPACITY: usize = 1;

/// One processed result, as pushed to subscribers.
///
/// Field names are capitalized on the wire; `Message` is the rendered,
/// priority-highlighted summary, `Original` the normalized text rendered as
/// markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushUpdate {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Original")]
    pub original: String,
}

/// Handle to one registered subscriber: receives pushed updates and names
/// the registry entry to deregister.
pub struct Subscriber {
    pub id: Uuid,
    rx: mpsc::Receiver<PushUpdate>,
}

impl Subscriber {
    /// Await the next update. `None` once deregistered and drained.
    pub async fn recv(&mut self) -> Option<PushUpdate> {
        self.rx.recv().await
    }
}

/// Registry of live push subscribers.
///
/// `publish` fans out from the orchestrator's task while connection tasks
/// attach and detach concurrently; the `RwLock`ed map keeps add/remove/
/// iterate race-free, and a subscriber that vanished mid-publish is a no-op.
pub struct PushHub {
    subscribers: RwLock<HashMap<Uuid, mpsc::Sender<PushUpdate>>>,
}

impl PushHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: RwLock::new(HashMap::new()),
        })
    }

    /// Register a new subscriber with an empty mailbox.
    pub async fn subscribe(&self) -> Subscriber {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, tx);
        info!(subscriber = %id, "Subscriber registered");
        Subscriber { id, rx }
    }

    /// Remove a subscriber. Removing an unknown id is a no-op.
    pub async fn unsubscribe(&self, id: Uuid) {
        if self.subscribers.write().await.remove(&id).is_some() {
            info!(subscriber = %id, "Subscriber removed");
        }
    }

    /// Offer an update to every current subscriber without blocking.
    ///
    /// Never blocks and never fails, whatever the subscriber count: a full
    /// mailbox drops the update for that subscriber only, and mailboxes
    /// whose receiver is gone are pruned lazily.
    pub async fn publish(&self, update: PushUpdate) {
        let mut closed = Vec::new();
        {
            let subscribers = self.subscribers.read().await;
            debug!(
                subscribers = subscribers.len(),
                subject = %update.subject,
                "Publishing update"
            );
            for (id, tx) in subscribers.iter() {
                match tx.try_send(update.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        debug!(subscriber = %id, "Mailbox full, dropping update");
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &closed {
                subscribers.remove(id);
            }
            debug!(removed = closed.len(), "Pruned closed subscribers");
        }
    }

    /// Number of live subscribers, for diagnostics.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}
