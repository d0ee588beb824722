//! Observability collaborator.

use tracing::info;

use concierge_core::events::ChatEvent;

/// Receives chat events. Implementations must not block; the engine does
/// not wait for or look at the outcome.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &ChatEvent);
}

/// Forwards events to `tracing` as structured records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: &ChatEvent) {
        match event {
            ChatEvent::Interaction {
                session_id,
                intent_name,
                raw_text,
                latency_ms,
                ..
            } => info!(
                target: "concierge::telemetry",
                event = event.event_name(),
                session_id = %session_id,
                intent = %intent_name,
                raw_text = %raw_text,
                latency_ms = *latency_ms,
                "Chatbot interaction"
            ),
            ChatEvent::ChatClosed {
                session_id,
                message_count,
                ..
            } => info!(
                target: "concierge::telemetry",
                event = event.event_name(),
                session_id = %session_id,
                message_count = *message_count,
                "Chat closed"
            ),
            other => info!(
                target: "concierge::telemetry",
                event = other.event_name(),
                session_id = %other.session_id(),
                timestamp = %other.timestamp(),
                "Chat event"
            ),
        }
    }
}
