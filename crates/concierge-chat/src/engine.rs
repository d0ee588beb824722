//! Conversation engine: central coordinator wiring catalog, matcher,
//! selector, history and the host's collaborators.
//!
//! One engine serves one visitor. Input arriving while a reply is still
//! "typing" is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info};

use concierge_core::config::ChatConfig;
use concierge_core::events::ChatEvent;
use concierge_core::types::{ConversationExport, Message, SessionId};
use concierge_storage::KeyValueStore;

use crate::catalog::{CatalogLoader, IntentCatalog};
use crate::error::ChatError;
use crate::history::HistoryStore;
use crate::matcher::match_intent;
use crate::render::{NullRenderer, Renderer};
use crate::selector::{select_response, BotResponse};
use crate::session::{generate_session_id, get_or_create_session};
use crate::telemetry::TelemetrySink;

/// Randomness source used for response selection.
pub type SharedRng = Box<dyn RngCore + Send>;

/// Shown in place of the conversation after the history is cleared.
pub const CLEARED_NOTICE: &str = "Chat history cleared. How can I help you?";

/// The chat assistant for a single visitor.
pub struct ConversationEngine {
    config: ChatConfig,
    catalog: Arc<IntentCatalog>,
    history: Mutex<HistoryStore>,
    session_id: SessionId,
    rng: Mutex<SharedRng>,
    renderer: Arc<dyn Renderer>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    responding: AtomicBool,
    open: AtomicBool,
}

impl ConversationEngine {
    /// Create an engine from fully assembled collaborators.
    pub fn new(
        config: ChatConfig,
        catalog: IntentCatalog,
        history: HistoryStore,
        session_id: SessionId,
        rng: SharedRng,
        renderer: Arc<dyn Renderer>,
        telemetry: Option<Arc<dyn TelemetrySink>>,
    ) -> Self {
        Self {
            config,
            catalog: Arc::new(catalog),
            history: Mutex::new(history),
            session_id,
            rng: Mutex::new(rng),
            renderer,
            telemetry,
            responding: AtomicBool::new(false),
            open: AtomicBool::new(false),
        }
    }

    /// Start building an engine. Unset parts get in-memory defaults.
    pub fn builder(config: ChatConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Assemble an engine the way a host page does on load: fetch the
    /// catalog, restore the durable history, and resume or start the session.
    pub async fn bootstrap(
        config: ChatConfig,
        durable: Arc<dyn KeyValueStore>,
        session_scope: &dyn KeyValueStore,
        renderer: Arc<dyn Renderer>,
        telemetry: Option<Arc<dyn TelemetrySink>>,
    ) -> Self {
        let loaded = CatalogLoader::from_config(&config).load().await;
        let history = HistoryStore::open(
            durable,
            config.storage_key.clone(),
            config.max_history_length,
        );
        let mut rng = StdRng::from_os_rng();
        let session_id = get_or_create_session(session_scope, &config.session_key, &mut rng);

        let mut builder = Self::builder(config)
            .catalog(loaded.catalog)
            .history(history)
            .session_id(session_id)
            .rng(Box::new(rng))
            .renderer(renderer);
        if let Some(sink) = telemetry {
            builder = builder.telemetry(sink);
        }
        builder.build()
    }

    // -----------------------------------------------------------------
    // Conversation
    // -----------------------------------------------------------------

    /// Answer one visitor message.
    ///
    /// Returns `None` when the input is blank or another reply is still
    /// pending; in both cases nothing is rendered or recorded.
    pub async fn handle_user_input(&self, text: &str) -> Option<BotResponse> {
        match self.try_handle_user_input(text).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(session_id = %self.session_id, reason = %e, "Input dropped");
                None
            }
        }
    }

    /// Like [`handle_user_input`](Self::handle_user_input), but says why
    /// input was dropped.
    pub async fn try_handle_user_input(&self, text: &str) -> Result<BotResponse, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let guard = RespondingGuard::acquire(&self.responding).ok_or(ChatError::Busy)?;
        let started = Instant::now();

        let user_message = Message::from_user(text);
        self.renderer.append_message(&user_message);
        self.lock_history().append(user_message);

        self.renderer.show_typing();
        tokio::time::sleep(Duration::from_millis(self.config.typing_delay_ms)).await;

        let intent = match_intent(text, &self.catalog);
        let response = {
            let mut rng = lock(&self.rng);
            select_response(intent, &self.catalog, &mut *rng)
        };

        self.renderer.hide_typing();
        let bot_message = Message::from_bot(response.text.as_str());
        self.renderer.append_message(&bot_message);
        self.lock_history().append(bot_message);

        if !response.follow_ups.is_empty() {
            self.renderer.show_follow_ups(&response.follow_ups);
        }
        if let Some(action) = &response.action {
            self.renderer.request_action(action);
        }
        drop(guard);

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            session_id = %self.session_id,
            intent = %response.intent,
            latency_ms,
            "Reply sent"
        );
        self.emit(ChatEvent::Interaction {
            session_id: self.session_id.clone(),
            intent_name: response.intent.clone(),
            raw_text: text.to_string(),
            latency_ms,
            timestamp: Utc::now(),
        });

        Ok(response)
    }

    /// A follow-up shortcut was clicked.
    pub async fn select_follow_up(&self, label: &str) -> Option<BotResponse> {
        self.handle_user_input(label).await
    }

    // -----------------------------------------------------------------
    // Widget lifecycle
    // -----------------------------------------------------------------

    /// Re-render the tail of the restored history and announce start-up.
    ///
    /// Restored messages are drawn only; they are not appended again.
    pub fn init(&self) {
        let recent = self
            .lock_history()
            .load_recent(self.config.recent_render_limit);
        for message in &recent {
            self.renderer.append_message(message);
        }
        info!(
            session_id = %self.session_id,
            restored = recent.len(),
            intents = self.catalog.len(),
            "Chatbot initialized"
        );
        self.emit(ChatEvent::ChatbotInitialized {
            session_id: self.session_id.clone(),
            timestamp: Utc::now(),
        });
    }

    pub fn open(&self) {
        if self.open.swap(true, Ordering::SeqCst) {
            return;
        }
        self.emit(ChatEvent::ChatOpened {
            session_id: self.session_id.clone(),
            timestamp: Utc::now(),
        });
    }

    /// Close the window and flush the history to storage.
    pub fn close(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        let message_count = {
            let history = self.lock_history();
            history.flush();
            history.len()
        };
        self.emit(ChatEvent::ChatClosed {
            session_id: self.session_id.clone(),
            message_count,
            timestamp: Utc::now(),
        });
    }

    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    // -----------------------------------------------------------------
    // History
    // -----------------------------------------------------------------

    pub fn clear_history(&self) {
        self.lock_history().clear();
        self.renderer.reset(CLEARED_NOTICE);
        info!(session_id = %self.session_id, "Chat history cleared");
    }

    pub fn export_conversation(&self) -> ConversationExport {
        self.lock_history().export_all(&self.session_id)
    }

    pub fn recent_messages(&self, limit: usize) -> Vec<Message> {
        self.lock_history().load_recent(limit)
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn is_responding(&self) -> bool {
        self.responding.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    // -- Private helpers --

    fn lock_history(&self) -> MutexGuard<'_, HistoryStore> {
        lock(&self.history)
    }

    fn emit(&self, event: ChatEvent) {
        if !self.config.enable_logging {
            return;
        }
        if let Some(sink) = &self.telemetry {
            sink.record(&event);
        }
    }
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("session_id", &self.session_id)
            .field("intents", &self.catalog.len())
            .field("responding", &self.is_responding())
            .field("open", &self.is_open())
            .finish()
    }
}

/// A poisoned lock only means a renderer panicked mid-call; the data
/// behind it is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds the "is responding" flag for the lifetime of one reply.
struct RespondingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RespondingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RespondingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// EngineBuilder
// =============================================================================

/// Builder for [`ConversationEngine`].
pub struct EngineBuilder {
    config: ChatConfig,
    catalog: Option<IntentCatalog>,
    history: Option<HistoryStore>,
    session_id: Option<SessionId>,
    rng: Option<SharedRng>,
    renderer: Option<Arc<dyn Renderer>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl EngineBuilder {
    fn new(config: ChatConfig) -> Self {
        Self {
            config,
            catalog: None,
            history: None,
            session_id: None,
            rng: None,
            renderer: None,
            telemetry: None,
        }
    }

    pub fn catalog(mut self, catalog: IntentCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn history(mut self, history: HistoryStore) -> Self {
        self.history = Some(history);
        self
    }

    pub fn session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn build(self) -> ConversationEngine {
        let mut rng = self
            .rng
            .unwrap_or_else(|| Box::new(StdRng::from_os_rng()));
        let session_id = self
            .session_id
            .unwrap_or_else(|| generate_session_id(&mut rng));
        let history = self
            .history
            .unwrap_or_else(|| HistoryStore::in_memory(self.config.max_history_length));

        ConversationEngine::new(
            self.config,
            self.catalog.unwrap_or_else(IntentCatalog::builtin),
            history,
            session_id,
            rng,
            self.renderer.unwrap_or_else(|| Arc::new(NullRenderer)),
            self.telemetry,
        )
    }
}
