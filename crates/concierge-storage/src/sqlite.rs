//! SQLite-backed durable key-value store.
//!
//! Each store instance is bound to a scope (the site the widget runs for),
//! so several sites can share one database file without seeing each
//! other's keys.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use concierge_core::error::ConciergeError;

use crate::db::Database;
use crate::kv::KeyValueStore;

/// Durable store for one scope.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
    scope: String,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>, scope: impl Into<String>) -> Self {
        Self {
            db,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConciergeError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE scope = ?1 AND key = ?2",
                rusqlite::params![self.scope, key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| ConciergeError::Storage(format!("Failed to read {}: {}", key, e)))
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_entries (scope, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (scope, key)
                 DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![self.scope, key, value, Utc::now().timestamp()],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to write {}: {}", key, e)))?;
            debug!(scope = %self.scope, key, bytes = value.len(), "kv entry written");
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), ConciergeError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM kv_entries WHERE scope = ?1 AND key = ?2",
                rusqlite::params![self.scope, key],
            )
            .map_err(|e| ConciergeError::Storage(format!("Failed to remove {}: {}", key, e)))?;
            Ok(())
        })
    }
}

/// Extension trait for rusqlite to support optional query results.
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
