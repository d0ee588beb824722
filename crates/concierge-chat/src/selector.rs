//! Response selection for a matched intent.

use rand::Rng;
use serde::Serialize;

use crate::catalog::IntentCatalog;

/// What the assistant says back, plus the shortcuts to offer next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotResponse {
    /// The intent the reply was drawn from (the fallback if the requested
    /// name was unknown).
    pub intent: String,
    pub text: String,
    pub follow_ups: Vec<String>,
    pub action: Option<String>,
}

/// Pick a reply for `intent_name`.
///
/// Unknown names resolve to the fallback intent. A single response is
/// returned verbatim; with several, one is drawn uniformly from `rng`.
pub fn select_response<R: Rng>(
    intent_name: &str,
    catalog: &IntentCatalog,
    rng: &mut R,
) -> BotResponse {
    let intent = catalog
        .get(intent_name)
        .unwrap_or_else(|| catalog.fallback());

    let text = match intent.responses.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        many => many[rng.random_range(0..many.len())].clone(),
    };

    BotResponse {
        intent: intent.name.clone(),
        text,
        follow_ups: intent.follow_ups.clone(),
        action: intent.action.clone(),
    }
}
