use serde::{Deserialize, Serialize};

use crate::types::{SessionId, Timestamp};

/// Events the chat engine reports to its observability collaborator.
///
/// Emission is fire-and-forget: sinks receive a clone and the engine never
/// waits on or inspects the outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChatEvent {
    /// The engine finished starting up and restored its history.
    ChatbotInitialized {
        session_id: SessionId,
        timestamp: Timestamp,
    },

    /// The chat window was opened.
    ChatOpened {
        session_id: SessionId,
        timestamp: Timestamp,
    },

    /// The chat window was closed; `message_count` is the retained log size.
    ChatClosed {
        session_id: SessionId,
        message_count: usize,
        timestamp: Timestamp,
    },

    /// One visitor message was answered.
    Interaction {
        session_id: SessionId,
        intent_name: String,
        raw_text: String,
        latency_ms: u64,
        timestamp: Timestamp,
    },
}

impl ChatEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            ChatEvent::ChatbotInitialized { timestamp, .. }
            | ChatEvent::ChatOpened { timestamp, .. }
            | ChatEvent::ChatClosed { timestamp, .. }
            | ChatEvent::Interaction { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the session the event belongs to.
    pub fn session_id(&self) -> &SessionId {
        match self {
            ChatEvent::ChatbotInitialized { session_id, .. }
            | ChatEvent::ChatOpened { session_id, .. }
            | ChatEvent::ChatClosed { session_id, .. }
            | ChatEvent::Interaction { session_id, .. } => session_id,
        }
    }

    /// Returns the wire name used by analytics backends.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::ChatbotInitialized { .. } => "chatbot_initialized",
            ChatEvent::ChatOpened { .. } => "chat_opened",
            ChatEvent::ChatClosed { .. } => "chat_closed",
            ChatEvent::Interaction { .. } => "chatbot_interaction",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_timestamp() {
        let ts = Utc::now();
        let event = ChatEvent::ChatOpened {
            session_id: SessionId::new("s1"),
            timestamp: ts,
        };
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_names() {
        let sid = SessionId::new("s1");
        let ts = Utc::now();
        let cases = vec![
            (
                ChatEvent::ChatbotInitialized {
                    session_id: sid.clone(),
                    timestamp: ts,
                },
                "chatbot_initialized",
            ),
            (
                ChatEvent::ChatOpened {
                    session_id: sid.clone(),
                    timestamp: ts,
                },
                "chat_opened",
            ),
            (
                ChatEvent::ChatClosed {
                    session_id: sid.clone(),
                    message_count: 4,
                    timestamp: ts,
                },
                "chat_closed",
            ),
            (
                ChatEvent::Interaction {
                    session_id: sid.clone(),
                    intent_name: "greeting".into(),
                    raw_text: "hello".into(),
                    latency_ms: 600,
                    timestamp: ts,
                },
                "chatbot_interaction",
            ),
        ];
        for (event, name) in cases {
            assert_eq!(event.event_name(), name);
            assert_eq!(event.session_id(), &sid);
        }
    }

    #[test]
    fn test_event_serialization() {
        let event = ChatEvent::Interaction {
            session_id: SessionId::new("s1"),
            intent_name: "shipping".into(),
            raw_text: "when will it arrive".into(),
            latency_ms: 800,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Interaction"));
        assert!(json.contains("shipping"));
    }
}
