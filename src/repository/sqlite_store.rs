//! SQLite Key-Value Store
//!
//! Durable storage area backed by a single `kv` table. Used when the page
//! runs inside a host that exposes a file-backed profile instead of a
//! browser storage area.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use super::traits::{KeyValueStore, StorageEvent};
use crate::domain::{DomainError, DomainResult};

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1 << 32);

/// SQLite implementation of a storage area
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
    events: broadcast::Sender<StorageEvent>,
    origin: u64,
}

impl SqliteKvStore {
    /// Open (or create) the database at `path` and run migrations.
    /// `:memory:` gives a private in-memory database.
    pub fn open(path: &Path) -> DomainResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DomainError::Persistence(format!("Failed to open db: {}", e)))?;

        run_migrations(&conn)?;

        let (events, _) = broadcast::channel(64);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            events,
            origin: NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed),
        })
    }
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .map_err(|e| DomainError::Persistence(e.to_string()))?;

    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
            row.get::<_, String>(0)
        })
        .optional()
        .map_err(|e| DomainError::Persistence(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        let conn = self.conn.lock().await;

        let old_value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| DomainError::Persistence(e.to_string()))?;

        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )
        .map_err(|e| DomainError::Persistence(e.to_string()))?;
        drop(conn);

        if old_value.as_deref() != Some(value) {
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: Some(value.to_string()),
                origin: self.origin,
            });
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        let conn = self.conn.lock().await;
        let old_value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .map_err(|e| DomainError::Persistence(e.to_string()))?;
        drop(conn);

        if old_value.is_some() {
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: None,
                origin: self.origin,
            });
        }
        Ok(())
    }

    fn origin(&self) -> u64 {
        self.origin
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
