//! Pattern-based intent classifier.
//!
//! The classifier evaluates an ordered table of [`CategoryRule`]s. Each rule
//! contributes at most one candidate (its first matching pattern), and the
//! candidate with the strictly greatest confidence wins. Equal confidences
//! resolve to the earlier rule, so table order is part of the contract.

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use crate::types::{clamp_confidence, QueryKind, DEFAULT_CONFIDENCE};

/// A single compiled pattern with a stable label.
#[derive(Debug, Clone)]
pub struct RulePattern {
    /// Label reported as `matched_rule`, e.g. `sizing/0`.
    pub label: String,
    regex: Regex,
}

impl RulePattern {
    /// Whether the pattern matches the text.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// One category of the classification table.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Kind assigned when this rule is selected.
    pub kind: QueryKind,
    /// Fixed confidence of this rule.
    pub confidence: f64,
    patterns: Vec<RulePattern>,
}

impl CategoryRule {
    /// Compile a rule from case-insensitive regex sources.
    ///
    /// Patterns that fail to compile are skipped with a warning; labels keep
    /// the source index so they stay stable.
    pub fn new(kind: QueryKind, confidence: f64, sources: &[&str]) -> Self {
        let prefix = kind.as_str().to_lowercase();
        let patterns = sources
            .iter()
            .enumerate()
            .filter_map(|(index, source)| {
                match RegexBuilder::new(source).case_insensitive(true).build() {
                    Ok(regex) => Some(RulePattern {
                        label: format!("{prefix}/{index}"),
                        regex,
                    }),
                    Err(e) => {
                        warn!(kind = %kind, pattern = %source, error = %e, "skipping invalid classifier pattern");
                        None
                    }
                }
            })
            .collect();
        Self {
            kind,
            confidence: clamp_confidence(confidence),
            patterns,
        }
    }

    /// Label of the first pattern that matches, if any.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.is_match(text))
            .map(|p| p.label.as_str())
    }

    /// Number of compiled patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Selected kind.
    pub kind: QueryKind,
    /// Confidence of the selected rule, or the default.
    pub confidence: f64,
    /// Label of the pattern that selected the kind.
    pub matched_rule: Option<String>,
}

impl Classification {
    /// The result used when nothing matches.
    pub fn fallback() -> Self {
        Self {
            kind: QueryKind::default(),
            confidence: DEFAULT_CONFIDENCE,
            matched_rule: None,
        }
    }
}

/// Evaluate a rule table against normalized text.
pub fn evaluate(rules: &[CategoryRule], text: &str) -> Classification {
    let mut best: Option<Classification> = None;

    for rule in rules {
        let Some(label) = rule.first_match(text) else {
            continue;
        };
        let improves = best
            .as_ref()
            .map_or(true, |current| rule.confidence > current.confidence);
        if improves {
            best = Some(Classification {
                kind: rule.kind,
                confidence: rule.confidence,
                matched_rule: Some(label.to_owned()),
            });
        }
    }

    best.unwrap_or_else(Classification::fallback)
}

/// Classifier over an ordered rule table.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    rules: Vec<CategoryRule>,
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternClassifier {
    /// Classifier with the built-in trend-question table.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Classifier with a caller-supplied table.
    pub fn with_rules(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// The rule table in evaluation order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Classify normalized (trimmed, lower-cased) text.
    pub fn classify(&self, normalized: &str) -> Classification {
        let result = evaluate(&self.rules, normalized);
        debug!(
            kind = %result.kind,
            confidence = result.confidence,
            matched_rule = result.matched_rule.as_deref().unwrap_or("-"),
            "classified query"
        );
        result
    }
}

/// The built-in classification table.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            QueryKind::Comparison,
            0.9,
            &[
                r"\b(compare|vs\.?|versus|or)\b.*\b(vs\.?|or|versus)\b",
                r"should we.*(or|vs)",
                r"which.*(better|pick|choose|invest)",
                r"\bvs\.?\b",
                r"(warframe|pokemon|star wars).*(or|vs).*(crusader|zelda|trek)",
            ],
        ),
        CategoryRule::new(
            QueryKind::Sizing,
            0.9,
            &[
                r"how (big|large|popular|huge)",
                r"fandom size",
                r"market size",
                r"how many (fans|people|searches)",
                r"size of.*(fandom|community|audience)",
            ],
        ),
        CategoryRule::new(
            QueryKind::Calendar,
            0.85,
            &[
                r"upcoming|coming (soon|out|up)",
                r"release (date|schedule|calendar)",
                r"when.*(release|launch|come out)",
                r"new (releases|titles|games|movies)",
                r"\b(2025|2026|next year|next month|q[1-4])\b.*\b(release|launch)",
            ],
        ),
        CategoryRule::new(
            QueryKind::Opinion,
            0.85,
            &[
                r"what do you think",
                r"should (we|i) (invest|focus|prioritize)",
                r"worth (it|investing|pursuing)",
                r"recommend",
                r"your (take|opinion|thoughts)",
                r"good (opportunity|idea|investment)",
            ],
        ),
        CategoryRule::new(
            QueryKind::Search,
            0.9,
            &[
                r"any mention",
                r"search for",
                r"find.*(trend|mention)",
                r"do we have",
                r"is there.*(data|info|trend)",
                r"look up",
            ],
        ),
        CategoryRule::new(
            QueryKind::News,
            0.8,
            &[
                r"\b(free|deal|sale|discount)\b",
                r"epic (store|games)",
                r"steam sale",
                r"(announce|announced|announcement)",
                r"did.*(detect|see|notice|catch)",
                r"news about",
                r"latest on",
            ],
        ),
        CategoryRule::new(
            QueryKind::Regional,
            0.85,
            &[
                r"\bin (de|uk|us|fr|pl|eu|germany|france|poland|america|europe)\b",
                r"top.*(in|for) \w{2,}",
                r"(german|french|polish|american|european) (market|trend)",
                r"this week in",
            ],
        ),
        CategoryRule::new(
            QueryKind::DeepDive,
            0.8,
            &[
                r"tell me (about|more)",
                r"what (is|about|are)",
                r"more (about|on|info)",
                r"explain",
                r"breakdown",
                r"details (on|about)",
            ],
        ),
    ]
}
