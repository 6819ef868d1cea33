//! Merge a secondary (LLM) parse into a rule-based intent.
//!
//! The merge is field by field: the candidate's kind only wins with strictly
//! higher confidence, its entity list replaces the rule-based one when
//! non-empty, and its filters replace the rule-based ones when present. A
//! response that cannot be parsed leaves the rule-based intent untouched
//! apart from its provenance.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{
    rank_entities, Category, Entity, EntitySource, Provenance, QueryIntent, QueryKind, Region,
    UnknownCode,
};

/// Entity confidence used when the candidate omits its own confidence.
pub const DEFAULT_EXTERNAL_CONFIDENCE: f64 = 0.8;

const PREVIEW_CHARS: usize = 200;

/// Why a secondary response was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    /// Nothing left after unwrapping.
    #[error("secondary parse response is empty")]
    Empty,
    /// Not the expected JSON object.
    #[error("secondary parse response is not a valid parse object: {0}")]
    Malformed(String),
    /// A code outside the known vocabularies.
    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),
    /// Confidence outside [0, 1].
    #[error("secondary parse confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

#[derive(Debug, Deserialize)]
struct WireParse {
    query_type: String,
    entities: Option<Vec<String>>,
    category: Option<String>,
    region: Option<String>,
    confidence: Option<f64>,
}

/// A validated secondary parse.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryParse {
    /// Proposed kind.
    pub kind: QueryKind,
    /// Proposed entity names, trimmed and non-empty.
    pub entities: Vec<String>,
    /// Proposed category.
    pub category: Option<Category>,
    /// Proposed region.
    pub region: Option<Region>,
    /// Parser's own confidence.
    pub confidence: Option<f64>,
}

impl SecondaryParse {
    /// Parse a raw secondary parser response.
    ///
    /// Provider envelopes, `<think>` blocks, markdown fences and surrounding
    /// prose are stripped first.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError`] when the remaining text is not a parse object
    /// with known codes and an in-range confidence.
    pub fn from_response(raw: &str) -> Result<Self, MergeError> {
        let text = unwrap_response(raw);
        if text.is_empty() {
            return Err(MergeError::Empty);
        }
        let wire: WireParse =
            serde_json::from_str(&text).map_err(|e| MergeError::Malformed(e.to_string()))?;
        Self::try_from(wire)
    }
}

impl TryFrom<WireParse> for SecondaryParse {
    type Error = MergeError;

    fn try_from(wire: WireParse) -> Result<Self, Self::Error> {
        let kind = wire.query_type.parse::<QueryKind>()?;
        let region = non_empty(wire.region)
            .map(|code| code.parse::<Region>())
            .transpose()?;
        let category = non_empty(wire.category)
            .map(|code| code.parse::<Category>())
            .transpose()?;

        if let Some(confidence) = wire.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(MergeError::ConfidenceOutOfRange(confidence));
            }
        }

        let entities = wire
            .entities
            .unwrap_or_default()
            .into_iter()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(Self {
            kind,
            entities,
            category,
            region,
            confidence: wire.confidence,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Result of a merge attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Final intent.
    pub intent: QueryIntent,
    /// Why the candidate was discarded, if it was.
    pub diagnostic: Option<MergeError>,
}

/// Merge a raw secondary response into a rule-based intent.
///
/// Never fails: an unusable response yields the rule-based intent with
/// provenance [`Provenance::LlmParseFailed`] and the reason in
/// [`Merged::diagnostic`].
pub fn merge(rule: &QueryIntent, raw_response: &str) -> Merged {
    match SecondaryParse::from_response(raw_response) {
        Ok(candidate) => Merged {
            intent: merge_candidate(rule, &candidate),
            diagnostic: None,
        },
        Err(e) => {
            let preview: String = raw_response.chars().take(PREVIEW_CHARS).collect();
            warn!(error = %e, response_preview = %preview, "secondary parse failed, keeping rule-based intent");
            let mut intent = rule.clone();
            intent.provenance = Provenance::LlmParseFailed;
            Merged {
                intent,
                diagnostic: Some(e),
            }
        }
    }
}

/// Merge an already-validated candidate into a rule-based intent.
pub fn merge_candidate(rule: &QueryIntent, candidate: &SecondaryParse) -> QueryIntent {
    let mut merged = rule.clone();

    let overrides_kind = candidate
        .confidence
        .is_some_and(|confidence| confidence > rule.confidence);
    if overrides_kind {
        merged.kind = candidate.kind;
        if candidate.kind != rule.kind {
            merged.matched_rule = None;
        }
    }
    merged.confidence = rule.confidence.max(candidate.confidence.unwrap_or(0.0));

    if !candidate.entities.is_empty() {
        let confidence = candidate
            .confidence
            .unwrap_or(DEFAULT_EXTERNAL_CONFIDENCE);
        merged.entities = rank_entities(
            candidate
                .entities
                .iter()
                .map(|name| Entity::new(name.as_str(), confidence, EntitySource::External))
                .collect(),
        );
    }

    if candidate.category.is_some() {
        merged.category = candidate.category;
    }
    if candidate.region.is_some() {
        merged.region = candidate.region;
    }
    merged.provenance = Provenance::LlmEnhanced;

    debug!(
        kind = %merged.kind,
        confidence = merged.confidence,
        kind_overridden = overrides_kind,
        entities = merged.entities.len(),
        "merged secondary parse"
    );
    merged
}

/// Reduce a raw response to the JSON text of the parse object.
pub fn unwrap_response(raw: &str) -> String {
    let inner = envelope_text(raw.trim()).unwrap_or_else(|| raw.trim().to_owned());
    let without_tags = strip_reasoning_tags(&inner);
    let unfenced = extract_json_block(&without_tags)
        .map(str::to_owned)
        .unwrap_or(without_tags);
    object_slice(unfenced.trim()).to_owned()
}

/// Text inside a provider envelope, if `raw` is one.
///
/// Recognizes `candidates[0].content.parts[].text`, a string `content` or
/// `text` field, and a bare JSON string.
fn envelope_text(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    if let Value::String(text) = value {
        return Some(text);
    }
    if let Some(parts) = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        return Some(text);
    }
    ["content", "text"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Remove `<think>...</think>` blocks emitted by reasoning models.
///
/// Each block ends at the first closing tag after its opening tag. An
/// unclosed block runs to the end of the text. Closing tags with no opening
/// tag are dropped.
pub fn strip_reasoning_tags(response: &str) -> String {
    let mut kept = String::with_capacity(response.len());
    let mut rest = response;

    while let Some(open) = rest.find(THINK_OPEN) {
        kept.push_str(rest.get(..open).unwrap_or_default());
        let inside = rest
            .get(open.saturating_add(THINK_OPEN.len())..)
            .unwrap_or_default();
        rest = match inside.find(THINK_CLOSE) {
            Some(close) => inside
                .get(close.saturating_add(THINK_CLOSE.len())..)
                .unwrap_or_default(),
            None => "",
        };
    }
    kept.push_str(rest);

    kept.replace(THINK_CLOSE, "")
}

/// Content of the first markdown code fence.
fn extract_json_block(text: &str) -> Option<&str> {
    let start_marker_json = "```json";
    let start_marker_plain = "```";
    let end_marker = "```";

    let content_start = if let Some(pos) = text.find(start_marker_json) {
        pos.checked_add(start_marker_json.len())?
    } else {
        let pos = text.find(start_marker_plain)?;
        pos.checked_add(start_marker_plain.len())?
    };

    let rest = text.get(content_start..)?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end_pos = rest.find(end_marker)?;
    Some(rest.get(..end_pos)?.trim())
}

/// Slice from the first `{` to the last `}` when prose surrounds an object.
fn object_slice(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text.get(start..=end).unwrap_or(text),
        _ => text,
    }
}
