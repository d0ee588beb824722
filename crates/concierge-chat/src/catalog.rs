//! Intent catalog: the keyword table the matcher walks.
//!
//! A catalog is loaded once, from a URL or a file, and never changes
//! afterwards. Anything that goes wrong while loading degrades to the
//! built-in storefront catalog, so a usable catalog always exists.

use std::sync::LazyLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use concierge_core::config::ChatConfig;
use concierge_core::error::ConciergeError;

use crate::error::ChatError;

/// Name of the intent returned when nothing else matches.
pub const FALLBACK_INTENT: &str = "fallback";

// =============================================================================
// Intent
// =============================================================================

/// A named conversational topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub name: String,
    /// Lowercase substrings, checked in order.
    pub patterns: Vec<String>,
    /// One or more reply variants. Opaque text; may carry simple markup.
    pub responses: Vec<String>,
    /// Short labels offered as one-click replies.
    pub follow_ups: Vec<String>,
    /// Tag asking the host to show an auxiliary input, e.g. `capture_email`.
    pub action: Option<String>,
}

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
            responses: Vec::new(),
            follow_ups: Vec::new(),
            action: None,
        }
    }

    pub fn patterns(mut self, patterns: &[&str]) -> Self {
        self.patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn responses(mut self, responses: &[&str]) -> Self {
        self.responses = responses.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn follow_ups(mut self, follow_ups: &[&str]) -> Self {
        self.follow_ups = follow_ups.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

// =============================================================================
// IntentCatalog
// =============================================================================

/// Ordered, validated set of intents.
///
/// Invariants: names are unique, every intent has at least one response,
/// and an intent named [`FALLBACK_INTENT`] exists with no patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCatalog {
    intents: Vec<Intent>,
    fallback_index: usize,
}

impl IntentCatalog {
    /// Validate and build a catalog. Patterns are lowercased here so the
    /// matcher only has to normalize the input.
    pub fn new(mut intents: Vec<Intent>) -> Result<Self, ChatError> {
        if intents.is_empty() {
            return Err(ChatError::CatalogLoad("catalog has no intents".into()));
        }

        for (i, intent) in intents.iter().enumerate() {
            if intents[..i].iter().any(|other| other.name == intent.name) {
                return Err(ChatError::CatalogLoad(format!(
                    "duplicate intent '{}'",
                    intent.name
                )));
            }
            if intent.responses.is_empty() {
                return Err(ChatError::CatalogLoad(format!(
                    "intent '{}' has no responses",
                    intent.name
                )));
            }
        }

        let fallback_index = intents
            .iter()
            .position(|intent| intent.name == FALLBACK_INTENT)
            .ok_or_else(|| ChatError::CatalogLoad("missing 'fallback' intent".into()))?;
        if !intents[fallback_index].patterns.is_empty() {
            return Err(ChatError::CatalogLoad(
                "'fallback' intent must not declare patterns".into(),
            ));
        }

        for intent in &mut intents {
            for pattern in &mut intent.patterns {
                *pattern = pattern.to_lowercase();
            }
        }

        Ok(Self {
            intents,
            fallback_index,
        })
    }

    /// Parse and validate a catalog document.
    ///
    /// The document is a JSON object mapping intent name to
    /// `{patterns, responses, followUps, action}`; key order is the match order.
    pub fn from_json_str(document: &str) -> Result<Self, ChatError> {
        let entries: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(document)
                .map_err(|e| ChatError::CatalogLoad(format!("invalid document: {}", e)))?;

        let intents = entries
            .into_iter()
            .map(|(name, value)| {
                let doc: IntentDocument = serde_json::from_value(value).map_err(|e| {
                    ChatError::CatalogLoad(format!("intent '{}': {}", name, e))
                })?;
                Ok(doc.into_intent(name))
            })
            .collect::<Result<Vec<_>, ChatError>>()?;

        Self::new(intents)
    }

    /// The built-in storefront catalog.
    pub fn builtin() -> Self {
        BUILTIN_CATALOG.clone()
    }

    /// Intents in declaration order.
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn get(&self, name: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.name == name)
    }

    pub fn fallback(&self) -> &Intent {
        &self.intents[self.fallback_index]
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Wire shape of one catalog entry.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntentDocument {
    #[serde(default)]
    patterns: Option<Vec<String>>,
    responses: ResponseSet,
    #[serde(default, alias = "quickReplies")]
    follow_ups: Option<Vec<String>>,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponseSet {
    One(String),
    Many(Vec<String>),
}

impl IntentDocument {
    fn into_intent(self, name: String) -> Intent {
        let responses = match self.responses {
            ResponseSet::One(text) => vec![text],
            ResponseSet::Many(texts) => texts,
        };
        Intent {
            name,
            patterns: self.patterns.unwrap_or_default(),
            responses,
            follow_ups: self.follow_ups.unwrap_or_default(),
            action: self.action,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Where the active catalog came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOrigin {
    Fetched { location: String },
    BuiltIn,
}

/// A catalog together with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: IntentCatalog,
    pub origin: CatalogOrigin,
}

/// Fetches a catalog document from a URL or a local path.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    location: String,
    timeout: Duration,
}

impl CatalogLoader {
    pub fn new(location: impl Into<String>, timeout: Duration) -> Self {
        Self {
            location: location.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.intents_path.clone(),
            Duration::from_secs(config.catalog_timeout_secs),
        )
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Load the catalog. Never fails: any error yields the built-in catalog.
    pub async fn load(&self) -> LoadedCatalog {
        match self.try_load().await {
            Ok(catalog) => {
                info!(
                    location = %self.location,
                    intents = catalog.len(),
                    "Intent catalog loaded"
                );
                LoadedCatalog {
                    catalog,
                    origin: CatalogOrigin::Fetched {
                        location: self.location.clone(),
                    },
                }
            }
            Err(e) => {
                warn!(
                    location = %self.location,
                    error = %e,
                    "Using built-in intent catalog"
                );
                LoadedCatalog {
                    catalog: IntentCatalog::builtin(),
                    origin: CatalogOrigin::BuiltIn,
                }
            }
        }
    }

    async fn try_load(&self) -> Result<IntentCatalog, ChatError> {
        let document = self.fetch_document().await?;
        IntentCatalog::from_json_str(&document)
    }

    async fn fetch_document(&self) -> Result<String, ConciergeError> {
        if self.is_remote() {
            let client = reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| ConciergeError::Catalog(e.to_string()))?;
            let response = client
                .get(&self.location)
                .send()
                .await
                .map_err(|e| ConciergeError::Catalog(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ConciergeError::Catalog(format!("HTTP {}", status)));
            }
            response
                .text()
                .await
                .map_err(|e| ConciergeError::Catalog(e.to_string()))
        } else {
            tokio::fs::read_to_string(&self.location)
                .await
                .map_err(|e| ConciergeError::Catalog(format!("{}: {}", self.location, e)))
        }
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

// =============================================================================
// Built-in catalog
// =============================================================================

static BUILTIN_CATALOG: LazyLock<IntentCatalog> = LazyLock::new(|| {
    IntentCatalog::new(builtin_intents()).expect("built-in intent catalog is valid")
});

fn builtin_intents() -> Vec<Intent> {
    vec![
        Intent::new("greeting")
            .patterns(&["hi", "hello", "hey", "good morning", "good afternoon", "greetings"])
            .responses(&[
                "Hello! Welcome to Sx06 Luxe 👋 How can I assist you today?",
                "Hi there! Thanks for visiting Sx06 Luxe. What can I help you with?",
                "Welcome! I'm here to help you explore our luxury collection.",
            ])
            .follow_ups(&["Shop Collection", "Brand Story", "Shipping Info", "Contact Us"]),
        Intent::new("shop")
            .patterns(&["shop", "buy", "purchase", "collection", "products", "catalog"])
            .responses(&[
                "Explore our exclusive collection! Visit our <a href='gallery.html'>Gallery</a> to see customer looks and our latest pieces.",
                "Check out our <a href='gallery.html'>Gallery</a> for stunning customer photos and videos showcasing our luxury pieces!",
            ])
            .follow_ups(&["Shipping Info", "Sizing Guide", "Contact Us"]),
        Intent::new("story")
            .patterns(&["story", "about", "founded", "founder", "who", "history", "brand"])
            .responses(&[
                "Sx06 Luxe was founded by Abdulmuqeet in October 2025. The '06' represents the founder's day - a symbol of legacy and personal significance. We combine timeless sophistication with sustainable craft. Learn more on our <a href='about.html'>About page</a>.",
                "Our brand represents the intersection of luxury, sustainability, and innovation. Founded by Abdulmuqeet, the '06' honors the founder's special day. Discover our full story <a href='about.html'>here</a>.",
            ])
            .follow_ups(&["Shop Collection", "Sustainability", "Contact Us"]),
        Intent::new("shipping")
            .patterns(&["ship", "shipping", "deliver", "delivery", "send", "international"])
            .responses(&[
                "We ship worldwide! 🌍 Standard shipping takes 5-7 business days. Express options available. Free shipping on orders over $200.",
                "Shipping to your location: Standard (5-7 days), Express (2-3 days). Free shipping on orders $200+. Track your order anytime!",
            ])
            .follow_ups(&["Returns Policy", "Shop Collection", "Track Order"]),
        Intent::new("contact")
            .patterns(&["contact", "email", "phone", "reach", "talk", "support", "help"])
            .responses(&[
                "We'd love to hear from you! 💌<br>Email: hello@sx06luxe.com<br>Visit our <a href='contact.html'>Contact page</a><br>Response time: Within 24 hours",
                "Get in touch:<br>📧 hello@sx06luxe.com<br>📞 Available on our <a href='contact.html'>Contact page</a><br>We typically respond within 24 hours!",
            ])
            .follow_ups(&["Shop Collection", "Shipping Info", "Returns"]),
        Intent::new("sizing")
            .patterns(&["size", "sizing", "fit", "measurements", "dimensions"])
            .responses(&[
                "We offer sizes XS-XXL with detailed measurements on each product page. Need personalized fitting advice? Contact us at hello@sx06luxe.com or check our size guide.",
                "Our size range: XS, S, M, L, XL, XXL. Each product has detailed measurements. Not sure? We offer free size consultations - just contact us!",
            ])
            .follow_ups(&["Shop Collection", "Contact Us", "Returns Policy"]),
        Intent::new("returns")
            .patterns(&["return", "refund", "exchange", "policy", "unhappy"])
            .responses(&[
                "30-day return policy on unworn items with tags. Free returns on all orders. Items must be in original condition. <a href='contact.html'>Contact us</a> to initiate a return.",
                "Returns made easy: 30 days, free return shipping, full refund or exchange. Items must be unworn with tags. Start your return by contacting us!",
            ])
            .follow_ups(&["Shop Collection", "Contact Us", "Shipping Info"]),
        Intent::new("sustainability")
            .patterns(&["sustainable", "sustainability", "eco", "environment", "ethical", "green"])
            .responses(&[
                "Sustainability is core to Sx06 Luxe. We use 100% sustainable materials, ethical manufacturing, and carbon-neutral shipping. Learn more about our commitment on our <a href='about.html'>About page</a>.",
                "We're committed to luxury without compromise: sustainable materials, ethical labor practices, minimal waste, and carbon-neutral operations. It's luxury you can feel good about. 🌿",
            ])
            .follow_ups(&["Brand Story", "Shop Collection", "Materials Info"]),
        Intent::new("price")
            .patterns(&["price", "cost", "expensive", "cheap", "affordable", "how much"])
            .responses(&[
                "Our pieces range from $150-$800, reflecting premium materials and ethical craftsmanship. Each item is an investment in timeless luxury. View pricing in our <a href='gallery.html'>Gallery</a>.",
                "Prices vary by piece ($150-$800). We believe in transparent pricing that reflects true value: sustainable materials, fair wages, and exceptional quality.",
            ])
            .follow_ups(&["Shop Collection", "Sustainability", "Payment Options"]),
        Intent::new("payment")
            .patterns(&["payment", "pay", "checkout", "credit card", "paypal", "installment"])
            .responses(&[
                "We accept: Visa, Mastercard, Amex, PayPal, Apple Pay, Google Pay. Installment plans available through Shop Pay (4 interest-free payments).",
                "Payment options: All major credit cards, PayPal, Apple/Google Pay. Plus flexible installment plans through Shop Pay!",
            ])
            .follow_ups(&["Shop Collection", "Security Info", "Contact Us"]),
        Intent::new("gallery")
            .patterns(&["gallery", "photos", "pictures", "images", "customers", "reviews"])
            .responses(&[
                "Check out our <a href='gallery.html'>Customer Gallery</a>! See real customers wearing Sx06 Luxe with photos and videos. You can even submit your own!",
                "Our <a href='gallery.html'>Gallery</a> showcases authentic customer moments. Real people, real luxury. Add your photos too!",
            ])
            .follow_ups(&["View Gallery", "Submit Photo", "Shop Collection"]),
        Intent::new(FALLBACK_INTENT)
            .responses(&[
                "I'm here to help! I can assist with shopping, shipping, returns, sizing, our brand story, or any questions you have. What would you like to know?",
                "I didn't quite catch that. I can help with: shopping our collection, shipping info, returns, sizing, or brand information. What interests you?",
                "Let me help you! Try asking about our collection, shipping details, our sustainability practices, or how to contact us.",
            ])
            .follow_ups(&["Shop Collection", "Brand Story", "Shipping Info", "Contact Us"]),
        Intent::new("email_capture")
            .patterns(&["email", "subscribe", "newsletter", "updates"])
            .responses(&[
                "Stay connected! 💌 Please enter your email below and we'll send you exclusive updates, new arrivals, and special offers.",
                "Join our community! Share your email and be first to know about new collections and exclusive offers.",
            ])
            .action("capture_email")
            .follow_ups(&["Shop Collection", "No Thanks"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL_DOC: &str = r#"{
        "zeta": { "patterns": ["Zed"], "responses": "zeta reply" },
        "alpha": {
            "patterns": ["a"],
            "responses": ["one", "two"],
            "quickReplies": ["More"],
            "action": "capture_email"
        },
        "fallback": { "patterns": [], "responses": ["sorry"], "followUps": ["Help"] }
    }"#;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = IntentCatalog::builtin();
        let names: Vec<&str> = catalog.intents().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "greeting",
                "shop",
                "story",
                "shipping",
                "contact",
                "sizing",
                "returns",
                "sustainability",
                "price",
                "payment",
                "gallery",
                "fallback",
                "email_capture",
            ]
        );
        assert_eq!(catalog.fallback().name, FALLBACK_INTENT);
        assert!(catalog.fallback().patterns.is_empty());
        assert_eq!(
            catalog.get("email_capture").unwrap().action.as_deref(),
            Some("capture_email")
        );
    }

    #[test]
    fn test_builtin_catalog_revalidates() {
        let catalog = IntentCatalog::builtin();
        let rebuilt = IntentCatalog::new(catalog.intents().to_vec()).unwrap();
        assert_eq!(rebuilt, catalog);
    }

    #[test]
    fn test_from_json_preserves_declaration_order() {
        let catalog = IntentCatalog::from_json_str(SMALL_DOC).unwrap();
        let names: Vec<&str> = catalog.intents().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "fallback"]);
    }

    #[test]
    fn test_from_json_normalizes_fields() {
        let catalog = IntentCatalog::from_json_str(SMALL_DOC).unwrap();

        let zeta = catalog.get("zeta").unwrap();
        assert_eq!(zeta.patterns, vec!["zed"]);
        assert_eq!(zeta.responses, vec!["zeta reply"]);
        assert!(zeta.follow_ups.is_empty());
        assert!(zeta.action.is_none());

        let alpha = catalog.get("alpha").unwrap();
        assert_eq!(alpha.follow_ups, vec!["More"]);
        assert_eq!(alpha.action.as_deref(), Some("capture_email"));

        assert_eq!(catalog.fallback().follow_ups, vec!["Help"]);
    }

    #[test]
    fn test_from_json_missing_patterns_is_empty() {
        let doc = r#"{ "fallback": { "responses": "hi" } }"#;
        let catalog = IntentCatalog::from_json_str(doc).unwrap();
        assert!(catalog.fallback().patterns.is_empty());
    }

    #[test]
    fn test_rejects_missing_fallback() {
        let doc = r#"{ "greeting": { "patterns": ["hi"], "responses": "hello" } }"#;
        let err = IntentCatalog::from_json_str(doc).unwrap_err();
        assert!(matches!(err, ChatError::CatalogLoad(_)));
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn test_rejects_fallback_with_patterns() {
        let doc = r#"{ "fallback": { "patterns": ["x"], "responses": "hello" } }"#;
        assert!(IntentCatalog::from_json_str(doc).is_err());
    }

    #[test]
    fn test_rejects_empty_responses() {
        let doc = r#"{
            "greeting": { "patterns": ["hi"], "responses": [] },
            "fallback": { "responses": "ok" }
        }"#;
        let err = IntentCatalog::from_json_str(doc).unwrap_err();
        assert!(err.to_string().contains("greeting"));
    }

    #[test]
    fn test_rejects_wrong_types() {
        let doc = r#"{
            "greeting": { "patterns": "hi", "responses": "hello" },
            "fallback": { "responses": "ok" }
        }"#;
        assert!(IntentCatalog::from_json_str(doc).is_err());

        assert!(IntentCatalog::from_json_str("[1, 2, 3]").is_err());
        assert!(IntentCatalog::from_json_str("{}").is_err());
        assert!(IntentCatalog::from_json_str("not json").is_err());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let intents = vec![
            Intent::new("a").patterns(&["x"]).responses(&["1"]),
            Intent::new("a").patterns(&["y"]).responses(&["2"]),
            Intent::new(FALLBACK_INTENT).responses(&["?"]),
        ];
        assert!(IntentCatalog::new(intents).is_err());
    }

    #[tokio::test]
    async fn test_loader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL_DOC.as_bytes()).unwrap();
        let location = file.path().to_string_lossy().to_string();

        let loaded = CatalogLoader::new(location.clone(), Duration::from_secs(1))
            .load()
            .await;
        assert_eq!(loaded.origin, CatalogOrigin::Fetched { location });
        assert_eq!(loaded.catalog.len(), 3);
    }

    #[tokio::test]
    async fn test_loader_missing_file_falls_back() {
        let loaded = CatalogLoader::new("/nonexistent/chat-intents.json", Duration::from_secs(1))
            .load()
            .await;
        assert_eq!(loaded.origin, CatalogOrigin::BuiltIn);
        assert_eq!(loaded.catalog, IntentCatalog::builtin());
    }

    #[tokio::test]
    async fn test_loader_malformed_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "greeting": { "patterns": ["hi"] } }"#)
            .unwrap();
        let loaded = CatalogLoader::new(file.path().to_string_lossy(), Duration::from_secs(1))
            .load()
            .await;
        assert_eq!(loaded.origin, CatalogOrigin::BuiltIn);
    }

    #[tokio::test]
    async fn test_loader_unreachable_url_falls_back() {
        // Port 9 (discard) on localhost is closed in test environments.
        let loaded = CatalogLoader::new("http://127.0.0.1:9/intents.json", Duration::from_secs(2))
            .load()
            .await;
        assert_eq!(loaded.origin, CatalogOrigin::BuiltIn);
    }

    /// Serve a single HTTP response on a local port and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/intents.json", addr)
    }

    #[tokio::test]
    async fn test_loader_fetches_remote_catalog() {
        let location = serve_once(
            "200 OK",
            r#"{
                "hours": { "patterns": ["OPENING Hours"], "responses": "9 to 6" },
                "fallback": { "responses": "Sorry?" }
            }"#,
        )
        .await;

        let loaded = CatalogLoader::new(location.clone(), Duration::from_secs(5))
            .load()
            .await;
        assert_eq!(loaded.origin, CatalogOrigin::Fetched { location });
        assert_eq!(loaded.catalog.len(), 2);
        assert_eq!(
            loaded.catalog.get("hours").unwrap().patterns,
            vec!["opening hours"]
        );
    }

    #[tokio::test]
    async fn test_loader_error_status_falls_back() {
        let location = serve_once("404 Not Found", r#"{"error": "not found"}"#).await;

        let loaded = CatalogLoader::new(location, Duration::from_secs(5))
            .load()
            .await;
        assert_eq!(loaded.origin, CatalogOrigin::BuiltIn);
        assert_eq!(loaded.catalog, IntentCatalog::builtin());
    }

    #[test]
    fn test_loader_from_config() {
        let config = ChatConfig::default();
        let loader = CatalogLoader::from_config(&config);
        assert_eq!(loader.location(), "data/chat-intents.json");
        assert!(!loader.is_remote());
        assert!(CatalogLoader::new("https://x/y.json", Duration::from_secs(1)).is_remote());
    }
}
