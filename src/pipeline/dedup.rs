//! Duplicate suppression — fingerprints and the seen-store interface.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// A short deterministic digest identifying one surfaced message.
///
/// Computed from (date, sender, subject) only — the body is deliberately
/// excluded, so two messages sharing the triple collapse into a single
/// notification even when their bodies differ. CRC32 is collision-tolerant
/// by choice: this is best-effort de-dup, not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a stored digest (e.g. read back from a durable store).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest the (date, sender, subject) triple, in that order.
pub fn fingerprint(date: &str, from: &str, subject: &str) -> Fingerprint {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(date.as_bytes());
    hasher.update(from.as_bytes());
    hasher.update(subject.as_bytes());
    Fingerprint(format!("{:X}", hasher.finalize()))
}

/// Membership record of already-surfaced messages.
///
/// Insert-only: there is no removal or eviction. The in-memory
/// [`DedupTracker`] is the minimal required implementation; a durable
/// backing (see `crate::store`) is an optional strengthening that survives
/// restarts.
#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn was_seen(&self, fp: &Fingerprint) -> Result<bool, StoreError>;

    /// Idempotent insert.
    async fn mark_seen(&self, fp: &Fingerprint) -> Result<(), StoreError>;
}

/// In-memory seen set, process-lifetime only.
///
/// Restart-time duplicate notifications are accepted, as is unbounded
/// growth over the process lifetime. Injected into the orchestrator rather
/// than living in a global so tests get isolated instances.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: Mutex<HashSet<String>>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeenStore for DedupTracker {
    async fn was_seen(&self, fp: &Fingerprint) -> Result<bool, StoreError> {
        Ok(self.seen.lock().await.contains(fp.as_str()))
    }

    async fn mark_seen(&self, fp: &Fingerprint) -> Result<(), StoreError> {
        self.seen.lock().await.insert(fp.as_str().to_string());
        Ok(())
    }
}
