//! Key-value storage abstraction.
//!
//! Mirrors the browser storage contract the chat widget was written
//! against: string keys, string values, every call may fail.

use std::collections::HashMap;
use std::sync::Mutex;

use concierge_core::error::ConciergeError;

/// A scoped string-to-string store.
///
/// Implementations must be safe to share across threads; callers treat
/// every error as recoverable.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, ConciergeError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), ConciergeError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), ConciergeError>;
}

/// Process-lifetime store. Used for the session scope, which must not
/// outlive the running host.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ConciergeError> {
        self.entries
            .lock()
            .map_err(|e| ConciergeError::Storage(format!("memory store lock poisoned: {}", e)))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConciergeError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConciergeError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConciergeError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
