//! Conversational engine for the storefront assistant.
//!
//! Matches visitor text against a keyword intent catalog, picks a canned
//! reply, and keeps a bounded, persisted conversation log. Rendering and
//! analytics are collaborators injected by the host.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod history;
pub mod matcher;
pub mod render;
pub mod selector;
pub mod session;
pub mod telemetry;

pub use catalog::{CatalogLoader, CatalogOrigin, Intent, IntentCatalog, LoadedCatalog, FALLBACK_INTENT};
pub use engine::{ConversationEngine, EngineBuilder, SharedRng, CLEARED_NOTICE};
pub use error::ChatError;
pub use history::HistoryStore;
pub use matcher::match_intent;
pub use render::{NullRenderer, Renderer};
pub use selector::{select_response, BotResponse};
pub use session::{generate_session_id, get_or_create_session};
pub use telemetry::{TelemetrySink, TracingSink};
