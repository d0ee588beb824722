//! Concierge storage crate - scoped key-value persistence.
//!
//! Two scopes back the chat widget: a process-lifetime [`MemoryStore`]
//! standing in for per-tab session storage, and a WAL-mode SQLite
//! [`SqliteStore`] for durable, per-site storage that survives restarts.

pub mod db;
pub mod kv;
pub mod migrations;
pub mod sqlite;

pub use db::Database;
pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;
