//! Concierge terminal host - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Open the durable history store (SQLite)
//! 3. Bootstrap the conversation engine (catalog, history, session)
//! 4. Read visitor lines from stdin until `/quit` or EOF

mod cli;
mod terminal;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use concierge_chat::{ConversationEngine, TelemetrySink, TracingSink};
use concierge_core::config::ConciergeConfig;
use concierge_storage::{Database, KeyValueStore, MemoryStore, SqliteStore};

use cli::CliArgs;
use terminal::{Command, TerminalRenderer, HELP};

/// Storage scope for the history of the terminal host.
const DURABLE_SCOPE: &str = "terminal";

/// Open the SQLite-backed durable store, or keep history in memory if the
/// database cannot be opened.
fn open_durable_store(config: &ConciergeConfig) -> Arc<dyn KeyValueStore> {
    let data_dir = cli::expand_home(&config.general.data_dir);
    let db_path = data_dir.join("concierge.db");
    match Database::new(&db_path) {
        Ok(db) => {
            tracing::info!(path = %db_path.display(), "SQLite database opened");
            Arc::new(SqliteStore::new(Arc::new(db), DURABLE_SCOPE))
        }
        Err(e) => {
            tracing::warn!(
                path = %db_path.display(),
                error = %e,
                "Failed to open history database, history will not survive restart"
            );
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ConciergeConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Concierge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let durable = open_durable_store(&config);
    let session_scope = MemoryStore::new();

    // Engine.
    let renderer = Arc::new(TerminalRenderer::stdout());
    let telemetry: Arc<dyn TelemetrySink> = Arc::new(TracingSink);
    let engine = ConversationEngine::bootstrap(
        config.chat.clone(),
        durable,
        &session_scope,
        renderer.clone(),
        Some(telemetry),
    )
    .await;

    println!("{}", HELP);
    engine.init();
    engine.open();

    // Conversation loop.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Open => engine.open(),
            Command::Close => engine.close(),
            Command::Clear => engine.clear_history(),
            Command::Export => {
                let export = engine.export_conversation();
                println!("{}", serde_json::to_string_pretty(&export)?);
            }
            Command::Quit => break,
            Command::FollowUp(n) => match renderer.follow_up(n) {
                Some(label) => {
                    engine.select_follow_up(&label).await;
                }
                None => {
                    engine.handle_user_input(&line).await;
                }
            },
            Command::Say(text) => {
                engine.handle_user_input(&text).await;
            }
            Command::Unknown(cmd) => println!("Unknown command {}. {}", cmd, HELP),
        }
    }

    engine.close();
    tracing::info!(session_id = %engine.session_id(), "Concierge stopped");
    Ok(())
}
