//! In-Memory Storage Area
//!
//! Shared string storage modelled on a browser storage area: every handle
//! opened with `open_tab` sees the same data, and writes are broadcast to
//! all handles tagged with the writer's origin.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use super::traits::{KeyValueStore, StorageEvent};
use crate::domain::{DomainError, DomainResult};

const EVENT_CAPACITY: usize = 256;

struct Shared {
    data: Mutex<HashMap<String, String>>,
    writes: Mutex<HashMap<String, usize>>,
    events: broadcast::Sender<StorageEvent>,
    next_origin: AtomicU64,
    fail_writes: AtomicBool,
}

/// Handle onto a shared in-memory storage area
#[derive(Clone)]
pub struct LocalStorage {
    shared: Arc<Shared>,
    origin: u64,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                data: Mutex::new(HashMap::new()),
                writes: Mutex::new(HashMap::new()),
                events,
                next_origin: AtomicU64::new(1),
                fail_writes: AtomicBool::new(false),
            }),
            origin: 0,
        }
    }

    /// Another handle on the same data with its own origin (a second tab)
    pub fn open_tab(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            origin: self.shared.next_origin.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Make every write fail, as when the storage quota is exhausted
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of successful writes to `key` across all handles
    pub async fn write_count(&self, key: &str) -> usize {
        self.shared.writes.lock().await.get(key).copied().unwrap_or(0)
    }

    /// Write without broadcasting or counting (seeding test fixtures)
    pub async fn seed(&self, key: &str, value: &str) {
        self.shared.data.lock().await.insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for LocalStorage {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.shared.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        if self.shared.fail_writes.load(Ordering::Relaxed) {
            return Err(DomainError::Persistence(format!("quota exceeded writing {}", key)));
        }
        let old_value = self
            .shared
            .data
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        *self.shared.writes.lock().await.entry(key.to_string()).or_insert(0) += 1;

        if old_value.as_deref() != Some(value) {
            // No receivers is fine
            let _ = self.shared.events.send(StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: Some(value.to_string()),
                origin: self.origin,
            });
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        let old_value = self.shared.data.lock().await.remove(key);
        if old_value.is_some() {
            let _ = self.shared.events.send(StorageEvent {
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
        self.shared.events.subscribe()
    }
}
