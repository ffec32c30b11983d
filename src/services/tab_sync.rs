//! Change Listeners
//!
//! Background tasks feeding native bookmark notifications and storage
//! writes from other tabs into the manager, in the order received.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::manager::PanelBookmarkManager;

/// Running listener tasks; dropping this stops them
pub struct SyncTasks {
    native: JoinHandle<()>,
    storage: JoinHandle<()>,
}

impl SyncTasks {
    pub fn stop(&self) {
        self.native.abort();
        self.storage.abort();
    }
}

impl Drop for SyncTasks {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Subscribe to both streams and apply every event to `manager`
pub fn spawn_sync(manager: Arc<PanelBookmarkManager>) -> SyncTasks {
    let mut native_rx = manager.bookmarks().subscribe();
    let mut storage_rx = manager.overlay().primary().subscribe();

    let native_manager = Arc::clone(&manager);
    let native = tokio::spawn(async move {
        loop {
            match native_rx.recv().await {
                Ok(event) => native_manager.handle_native_event(&event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed native events, rebuilding view");
                    if let Err(e) = native_manager.refresh().await {
                        warn!(error = %e, "Rebuild after lag failed");
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Native event listener stopped");
    });

    let storage = tokio::spawn(async move {
        loop {
            match storage_rx.recv().await {
                Ok(event) => manager.handle_storage_event(&event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed storage events, rebuilding view");
                    if let Err(e) = manager.refresh().await {
                        warn!(error = %e, "Rebuild after lag failed");
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Storage listener stopped");
    });

    SyncTasks { native, storage }
}
