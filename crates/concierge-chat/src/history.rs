//! Bounded, persisted conversation log.
//!
//! The in-memory ring is the source of truth for the running session.
//! Storage is a best-effort mirror: read and write failures are logged and
//! swallowed, and never touch the in-memory log.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use concierge_core::error::ConciergeError;
use concierge_core::types::{ConversationExport, Message, SessionId};
use concierge_storage::{KeyValueStore, MemoryStore};

use crate::error::ChatError;

/// Ring buffer of messages mirrored to a key-value store.
pub struct HistoryStore {
    messages: VecDeque<Message>,
    capacity: usize,
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl HistoryStore {
    /// Open the log stored under `key`, restoring whatever is there.
    ///
    /// A capacity of zero is treated as one. A stored log that cannot be
    /// read starts the session empty; one that cannot be parsed is also
    /// removed from storage. A log longer than `capacity` keeps its newest
    /// entries and is written back trimmed.
    pub fn open(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        let key = key.into();
        let capacity = capacity.max(1);

        let mut messages = match Self::restore(store.as_ref(), &key) {
            Ok(messages) => messages,
            Err(e @ ChatError::MalformedHistory(_)) => {
                warn!(key = %key, error = %e, "Discarding stored chat history");
                if let Err(e) = store.remove(&key) {
                    warn!(key = %key, error = %e, "Failed to remove malformed chat history");
                }
                VecDeque::new()
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to load chat history");
                VecDeque::new()
            }
        };

        let trimmed = messages.len() > capacity;
        while messages.len() > capacity {
            messages.pop_front();
        }
        debug!(key = %key, restored = messages.len(), capacity, "Chat history opened");

        let history = Self {
            messages,
            capacity,
            store,
            key,
        };
        if trimmed {
            history.persist();
        }
        history
    }

    /// A log backed by a throwaway in-memory store.
    pub fn in_memory(capacity: usize) -> Self {
        Self::open(Arc::new(MemoryStore::new()), "history", capacity)
    }

    /// Append a message, evicting the oldest entry when the log is full.
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        self.persist();
    }

    /// The last `limit` messages, oldest first.
    pub fn load_recent(&self, limit: usize) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// Drop every message, in memory and in storage.
    pub fn clear(&mut self) {
        self.messages.clear();
        if let Err(e) = self.store.remove(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to clear stored chat history");
        }
    }

    /// The whole log, tagged with the session it belongs to.
    pub fn export_all(&self, session_id: &SessionId) -> ConversationExport {
        ConversationExport {
            session_id: session_id.clone(),
            messages: self.messages.iter().cloned().collect(),
            timestamp: Utc::now(),
        }
    }

    /// Write the current log to storage.
    pub fn flush(&self) {
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn persist(&self) {
        if let Err(e) = self.try_persist() {
            warn!(key = %self.key, error = %e, "Failed to save chat history");
        }
    }

    fn try_persist(&self) -> Result<(), ConciergeError> {
        let json = serde_json::to_string(&self.messages)?;
        self.store.set(&self.key, &json)
    }

    fn restore(store: &dyn KeyValueStore, key: &str) -> Result<VecDeque<Message>, ChatError> {
        let Some(raw) = store.get(key)? else {
            return Ok(VecDeque::new());
        };
        serde_json::from_str(&raw).map_err(|e| ChatError::MalformedHistory(e.to_string()))
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("key", &self.key)
            .field("len", &self.messages.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
