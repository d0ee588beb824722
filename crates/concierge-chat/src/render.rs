//! View-layer collaborator.
//!
//! The engine decides what to show; a [`Renderer`] decides how. Hosts
//! implement it for their surface (a web widget bridge, a terminal, ...).

use concierge_core::types::Message;

/// Display surface driven by the engine.
pub trait Renderer: Send + Sync {
    /// Show a message in the conversation pane.
    fn append_message(&self, message: &Message);

    /// Show the "assistant is typing" indicator.
    fn show_typing(&self);

    /// Remove the typing indicator.
    fn hide_typing(&self);

    /// Replace the current one-click replies. Clicking one should call
    /// `ConversationEngine::select_follow_up` with its label.
    fn show_follow_ups(&self, follow_ups: &[String]);

    /// Show the auxiliary input an intent asked for (e.g. `capture_email`).
    fn request_action(&self, _action: &str) {}

    /// Wipe the conversation pane and show `notice` in its place.
    fn reset(&self, _notice: &str) {}
}

/// Renderer that draws nothing. Used by headless hosts and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn append_message(&self, _message: &Message) {}
    fn show_typing(&self) {}
    fn hide_typing(&self) {}
    fn show_follow_ups(&self, _follow_ups: &[String]) {}
}
