//! Escalation gate and the secondary-parse request.
//!
//! A rule-based parse is escalated to the secondary parser when it is not
//! confident enough or is missing entities its kind depends on.

use crate::types::{QueryIntent, QueryKind};

/// Intents below this confidence are always escalated.
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Entities a comparison needs before it is considered complete.
pub const COMPARISON_MIN_ENTITIES: usize = 2;

/// Whether a kind cannot be answered without a primary entity.
pub fn requires_entity(kind: QueryKind) -> bool {
    match kind {
        QueryKind::DeepDive
        | QueryKind::Opinion
        | QueryKind::Sizing
        | QueryKind::Search
        | QueryKind::Comparison => true,
        QueryKind::Calendar | QueryKind::Regional | QueryKind::News => false,
    }
}

/// Decide whether the intent needs a secondary parse.
pub fn needs_escalation(intent: &QueryIntent) -> bool {
    if intent.confidence < CONFIDENCE_THRESHOLD {
        return true;
    }
    if intent.primary_entity().is_none() && requires_entity(intent.kind) {
        return true;
    }
    intent.kind == QueryKind::Comparison && intent.entities.len() < COMPARISON_MIN_ENTITIES
}

/// System instruction for the secondary parser.
pub const SYSTEM_PROMPT: &str = "\
You are a query parser for a trend intelligence tool used by a poster company.
Your job is to extract structured information from user queries about entertainment IPs (games, movies, anime, TV shows).

RESPOND ONLY WITH VALID JSON, no markdown, no explanation.";

/// Placeholder in [`USER_PROMPT_TEMPLATE`] replaced by the query text.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Per-query instruction; only [`QUERY_PLACEHOLDER`] varies.
pub const USER_PROMPT_TEMPLATE: &str = r#"Parse this query: "{query}"

Extract:
1. query_type: One of DEEP_DIVE, COMPARISON, SIZING, SEARCH, CALENDAR, REGIONAL, OPINION, NEWS
2. entities: Array of entertainment IP/title names mentioned (max 3)
3. category: GAMES, MOVIES, TV_SERIES, MANGA_ANIME, or null
4. region: Country code (US, DE, UK, FR, PL, EU) or null
5. confidence: Your confidence 0-1 in this parsing

Examples:
- "what about Path of Exile 2" → {"query_type":"DEEP_DIVE","entities":["Path of Exile 2"],"category":"GAMES","region":null,"confidence":0.95}
- "Warframe vs Crusader Kings" → {"query_type":"COMPARISON","entities":["Warframe","Crusader Kings"],"category":"GAMES","region":null,"confidence":0.9}
- "how big is Clair Obscur fandom" → {"query_type":"SIZING","entities":["Clair Obscur: Expedition 33"],"category":"GAMES","region":null,"confidence":0.85}
- "any free epic store games" → {"query_type":"NEWS","entities":[],"category":"GAMES","region":null,"confidence":0.8}

Important:
- Expand abbreviated titles to full names when confident (e.g., "PoE2" → "Path of Exile 2")
- For comparison, extract BOTH entities
- If query is about news/deals/free games, use NEWS type
- If asking "should we invest" or "what do you think", use OPINION type

JSON response:"#;

/// Instructions handed to the secondary parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    /// Fixed system instruction.
    pub system: &'static str,
    /// User instruction containing the query text.
    pub user: String,
    /// The query text on its own.
    pub query: String,
}

impl ParseRequest {
    /// Build the request for an intent's original text.
    pub fn for_intent(intent: &QueryIntent) -> Self {
        Self::for_text(&intent.original_text)
    }

    /// Build the request for raw query text.
    pub fn for_text(text: &str) -> Self {
        Self {
            system: SYSTEM_PROMPT,
            user: USER_PROMPT_TEMPLATE.replacen(QUERY_PLACEHOLDER, text, 1),
            query: text.to_owned(),
        }
    }
}
