use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;

use super::chat::ChatSession;
use crate::bolt::ExcludeList;

pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Chat id → live session. Sessions are created on first use.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, SharedSession>>>,
    exclude: ExcludeList,
}

impl SessionRegistry {
    pub fn new(exclude: ExcludeList) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            exclude,
        }
    }

    pub fn exclude(&self) -> &ExcludeList {
        &self.exclude
    }

    pub fn get_or_create(&self, chat_id: &str) -> SharedSession {
        let mut sessions = self.sessions.lock().expect("sessions mutex poisoned");
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(chat_id, "Creating chat session");
                Arc::new(Mutex::new(ChatSession::new(chat_id, self.exclude.clone())))
            })
            .clone()
    }

    pub fn get(&self, chat_id: &str) -> Option<SharedSession> {
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .get(chat_id)
            .cloned()
    }

    pub fn remove(&self, chat_id: &str) -> bool {
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .remove(chat_id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("sessions mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Generation {
    token: u64,
    handle: AbortHandle,
}

/// Chat id → in-flight generation. At most one stream per chat.
#[derive(Clone, Default)]
pub struct GenerationRegistry {
    running: Arc<Mutex<HashMap<String, Generation>>>,
    next_token: Arc<AtomicU64>,
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generation, aborting any previous one for the same chat.
    /// The returned token identifies this generation for [`finish`](Self::finish).
    pub fn start(&self, chat_id: &str, handle: AbortHandle) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .running
            .lock()
            .expect("generations mutex poisoned")
            .insert(chat_id.to_string(), Generation { token, handle });
        if let Some(previous) = previous {
            tracing::info!(chat_id, "Aborting previous generation");
            previous.handle.abort();
        }
        token
    }

    /// Drop the entry if it still belongs to the generation with `token`.
    pub fn finish(&self, chat_id: &str, token: u64) {
        let mut running = self.running.lock().expect("generations mutex poisoned");
        if running.get(chat_id).map_or(false, |g| g.token == token) {
            running.remove(chat_id);
        }
    }

    /// Abort the in-flight generation. Returns false when none was running.
    pub fn stop(&self, chat_id: &str) -> bool {
        let removed = self
            .running
            .lock()
            .expect("generations mutex poisoned")
            .remove(chat_id);
        match removed {
            Some(generation) => {
                generation.handle.abort();
                tracing::info!(chat_id, "Generation stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, chat_id: &str) -> bool {
        self.running
            .lock()
            .expect("generations mutex poisoned")
            .contains_key(chat_id)
    }
}
