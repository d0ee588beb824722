//! Session identifiers.
//!
//! One id per browsing session, kept in session-scoped storage so that
//! every engine built during the session reports the same id.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, warn};

use concierge_core::types::SessionId;
use concierge_storage::KeyValueStore;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Generate a fresh id: `session_<unix millis>_<9 base-36 chars>`.
pub fn generate_session_id<R: Rng>(rng: &mut R) -> SessionId {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    SessionId::new(format!("session_{}_{}", Utc::now().timestamp_millis(), suffix))
}

/// Return the id stored under `key`, creating and storing one if absent.
///
/// Storage failures only cost continuity: a new id is generated and the
/// failure is logged.
pub fn get_or_create_session<R: Rng>(
    store: &dyn KeyValueStore,
    key: &str,
    rng: &mut R,
) -> SessionId {
    match store.get(key) {
        Ok(Some(existing)) if !existing.is_empty() => return SessionId::new(existing),
        Ok(_) => {}
        Err(e) => warn!(key, error = %e, "Failed to read session id"),
    }

    let id = generate_session_id(rng);
    if let Err(e) = store.set(key, id.as_str()) {
        warn!(key, error = %e, "Failed to store session id");
    }
    debug!(session_id = %id, "New chat session");
    id
}
