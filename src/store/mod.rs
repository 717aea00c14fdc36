//! Durable seen-store — libSQL-backed `SeenStore` implementation.
//!
//! Optional strengthening of the in-memory `DedupTracker`: fingerprints
//! survive restarts, so a restarted process does not re-notify threads it
//! already surfaced. Selected via `DIGEST_DB_PATH`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database, params};
use tracing::info;

use crate::error::StoreError;
use crate::pipeline::dedup::{Fingerprint, SeenStore};

const SCHEMA: &str = "\
    CREATE TABLE IF NOT EXISTS seen_messages (
        fingerprint TEXT PRIMARY KEY,
        recorded_at TEXT NOT NULL
    );";

/// libSQL-backed seen store.
///
/// Holds a single connection reused for all operations;
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlSeenStore {
    #[allow(dead_code)]
    db: Arc<Database>,
    conn: Connection,
}

impl LibSqlSeenStore {
    /// Open (or create) a local database file and ensure the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create store directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open database: {e}")))?;
        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Seen store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self, StoreError> {
        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;
        conn.execute(SCHEMA, ())
            .await
            .map_err(|e| StoreError::Open(format!("Failed to ensure schema: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

#[async_trait]
impl SeenStore for LibSqlSeenStore {
    async fn was_seen(&self, fp: &Fingerprint) -> Result<bool, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM seen_messages WHERE fingerprint = ?1 LIMIT 1",
                params![fp.as_str()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let row = rows.next().await.map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn mark_seen(&self, fp: &Fingerprint) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO seen_messages (fingerprint, recorded_at) VALUES (?1, ?2)",
                params![fp.as_str(), chrono::Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }
}
