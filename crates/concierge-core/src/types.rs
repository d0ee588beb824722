use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC instant, serialized as RFC 3339.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque identifier of one browsing session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Messages
// =============================================================================

/// A single entry in the conversation log.
///
/// The serialized field names match what the web widget has always written
/// to storage, so existing logs stay readable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Rendered content. May contain simple markup; never parsed here.
    pub text: String,
    #[serde(rename = "isUser", alias = "isFromUser")]
    pub is_from_user: bool,
    pub timestamp: Timestamp,
}

impl Message {
    /// A message typed (or clicked) by the visitor, stamped now.
    pub fn from_user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_from_user: true,
            timestamp: Utc::now(),
        }
    }

    /// A reply emitted by the assistant, stamped now.
    pub fn from_bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_from_user: false,
            timestamp: Utc::now(),
        }
    }
}

/// Snapshot of the full conversation handed out for analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExport {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
    pub timestamp: Timestamp,
}
