use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConciergeError, Result};

/// Top-level configuration for the Concierge assistant.
///
/// Loaded from `~/.concierge/config.toml` by default. Every field has a
/// default, so a partial file (or no file at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConciergeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl ConciergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ConciergeConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConciergeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the durable history database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.concierge/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Chat engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Where the intent catalog is fetched from: an `http(s)://` URL or a file path.
    pub intents_path: String,
    /// Upper bound on a remote catalog fetch, in seconds.
    pub catalog_timeout_secs: u64,
    /// Maximum number of messages retained in the history log.
    pub max_history_length: usize,
    /// Artificial pause before a reply is emitted, in milliseconds.
    pub typing_delay_ms: u64,
    /// Whether interaction events are forwarded to the telemetry sink.
    pub enable_logging: bool,
    /// Durable storage key for the serialized history log.
    pub storage_key: String,
    /// Session-scoped storage key for the session id.
    pub session_key: String,
    /// How many stored messages are re-rendered when the widget starts.
    pub recent_render_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            intents_path: "data/chat-intents.json".to_string(),
            catalog_timeout_secs: 10,
            max_history_length: 50,
            typing_delay_ms: 800,
            enable_logging: true,
            storage_key: "concierge_chat_history".to_string(),
            session_key: "concierge_chat_session".to_string(),
            recent_render_limit: 10,
        }
    }
}
