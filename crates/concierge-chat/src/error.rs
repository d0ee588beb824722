//! Error types for the conversational engine.
//!
//! None of these reach the visitor: every variant is recovered where it is
//! raised and downgraded to a log record.

use concierge_core::error::ConciergeError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a reply is already in progress")]
    Busy,
    #[error("catalog load failed: {0}")]
    CatalogLoad(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("stored history is malformed: {0}")]
    MalformedHistory(String),
}

impl From<ConciergeError> for ChatError {
    fn from(err: ConciergeError) -> Self {
        match err {
            ConciergeError::Catalog(msg) => ChatError::CatalogLoad(msg),
            other => ChatError::Persistence(other.to_string()),
        }
    }
}
