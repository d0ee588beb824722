//! The SQLite file behind durable chat storage.
//!
//! One connection per process, shared by every scope.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use concierge_core::error::ConciergeError;

use crate::migrations;

/// Shared handle to the history database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode and synchronous=NORMAL, then runs all pending
    /// migrations.
    pub fn new(path: &Path) -> Result<Self, ConciergeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ConciergeError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| ConciergeError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub fn in_memory() -> Result<Self, ConciergeError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ConciergeError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Run `f` with exclusive use of the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ConciergeError>
    where
        F: FnOnce(&Connection) -> Result<T, ConciergeError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConciergeError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
