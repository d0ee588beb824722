//! Keyword intent matcher.
//!
//! First match wins: intents are tried in catalog order, patterns in
//! declared order, and a pattern matches when it is a plain substring of
//! the lowercased input. There is no word-boundary check, so a short
//! pattern can fire inside a longer word ("hi" inside "ship").

use tracing::debug;

use crate::catalog::IntentCatalog;

/// Return the name of the intent `text` resolves to.
///
/// Falls back to the catalog's fallback intent when no pattern matches.
pub fn match_intent<'a>(text: &str, catalog: &'a IntentCatalog) -> &'a str {
    let normalized = text.to_lowercase();

    for intent in catalog.intents() {
        if let Some(pattern) = intent
            .patterns
            .iter()
            .find(|pattern| normalized.contains(pattern.as_str()))
        {
            debug!(intent = %intent.name, pattern = %pattern, "Intent matched");
            return &intent.name;
        }
    }

    &catalog.fallback().name
}
