use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::db::Database;

/// A pending workspace write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncItem {
    pub chat_id: String,
    pub path: String,
    pub content: String,
}

#[derive(Default)]
struct QueueInner {
    order: Vec<(String, String)>,
    latest: HashMap<(String, String), String>,
}

/// Coalescing queue of workspace writes.
///
/// Writes to the same `(chat, path)` before a drain collapse into the latest
/// content, keeping the position of the first enqueue.
#[derive(Default)]
pub struct SyncQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, chat_id: &str, path: &str, content: impl Into<String>) {
        {
            let mut inner = self.inner.lock().expect("sync queue mutex poisoned");
            let key = (chat_id.to_string(), path.to_string());
            if !inner.latest.contains_key(&key) {
                inner.order.push(key.clone());
            }
            inner.latest.insert(key, content.into());
        }
        self.notify.notify_one();
    }

    pub fn drain(&self) -> Vec<SyncItem> {
        let mut inner = self.inner.lock().expect("sync queue mutex poisoned");
        let order = std::mem::take(&mut inner.order);
        let mut latest = std::mem::take(&mut inner.latest);
        order
            .into_iter()
            .filter_map(|key| {
                let content = latest.remove(&key)?;
                Some(SyncItem {
                    chat_id: key.0,
                    path: key.1,
                    content,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("sync queue mutex poisoned").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn notified(&self) {
        self.notify.notified().await
    }
}

/// Write one drained batch to the workspace store. Returns the number of
/// files written.
pub fn write_batch(db: &Database, batch: &[SyncItem]) -> usize {
    let mut written = 0;
    for item in batch {
        match db.upsert_workspace_file(&item.chat_id, &item.path, &item.content) {
            Ok(()) => written += 1,
            Err(e) => tracing::error!(
                chat_id = %item.chat_id,
                path = %item.path,
                "Failed to sync workspace file: {}",
                e
            ),
        }
    }
    written
}

/// Spawn the background task that drains `queue` into the workspace store.
pub fn spawn_sync_worker(queue: Arc<SyncQueue>, db: Database) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Workspace sync worker started");
        loop {
            queue.notified().await;
            let batch = queue.drain();
            if batch.is_empty() {
                continue;
            }
            let written = write_batch(&db, &batch);
            tracing::debug!(written, queued = batch.len(), "Synced workspace files");
        }
    })
}
