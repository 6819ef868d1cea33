//! Entity extraction heuristics.
//!
//! Each heuristic is independent and returns its own candidates. The
//! [`EntityExtractor`] runs them in a fixed order and ranks the union once
//! with [`rank_entities`].

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::{is_stop_word, ExtractionInput, Heuristic};
use crate::types::{rank_entities, Entity, EntitySource, QueryKind};

/// Confidence of quoted spans.
pub const QUOTED_CONFIDENCE: f64 = 0.95;
/// Confidence of comparison sides.
pub const COMPARISON_CONFIDENCE: f64 = 0.85;
/// Confidence of preposition-anchored phrases.
pub const PREPOSITION_CONFIDENCE: f64 = 0.75;
/// Confidence of capitalized phrases.
pub const TITLE_CASE_CONFIDENCE: f64 = 0.70;

/// Candidates must be longer than this many characters.
const MIN_NAME_CHARS: usize = 2;

fn compile(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(pattern, error = %e, "failed to compile extraction pattern");
            None
        }
    }
}

fn long_enough(name: &str) -> bool {
    name.chars().count() > MIN_NAME_CHARS
}

/// Text enclosed in matching quote characters.
///
/// A single-quoted span must open at the start of the text or after a
/// non-word character, and must not be followed by a letter or digit, so
/// apostrophes in "What's" or "Baldur's" never pair up.
#[derive(Debug, Clone)]
pub struct QuotedSpan {
    regex: Option<Regex>,
}

impl Default for QuotedSpan {
    fn default() -> Self {
        Self {
            regex: compile(r#""([^"]+)"|(?:^|[^\w'])'([^']+)'|“([^”]+)”"#, false),
        }
    }
}

fn closes_cleanly(raw: &str, end: usize) -> bool {
    raw.get(end..)
        .and_then(|tail| tail.chars().next())
        .map_or(true, |next| !next.is_alphanumeric())
}

impl Heuristic for QuotedSpan {
    fn name(&self) -> &str {
        "quoted"
    }

    fn candidates(&self, input: &ExtractionInput<'_>) -> Vec<Entity> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        regex
            .captures_iter(input.raw)
            .filter_map(|caps| match caps.get(2) {
                Some(single) => caps
                    .get(0)
                    .filter(|whole| closes_cleanly(input.raw, whole.end()))
                    .map(|_| single),
                None => caps.get(1).or_else(|| caps.get(3)),
            })
            .map(|m| m.as_str().trim())
            .filter(|name| !name.is_empty())
            .map(|name| Entity::new(name, QUOTED_CONFIDENCE, EntitySource::Quoted))
            .collect()
    }
}

/// Left and right sides of an "X vs Y" question. Comparison queries only.
#[derive(Debug, Clone)]
pub struct ComparisonSplit {
    split: Option<Regex>,
    boilerplate: Option<Regex>,
}

impl Default for ComparisonSplit {
    fn default() -> Self {
        Self {
            split: compile(r"(.+?)\s+(?:vs\.?|or|versus)\s+(.+?)(?:\?|$)", true),
            boilerplate: compile(r"should we invest in|fandom|which is better", true),
        }
    }
}

impl ComparisonSplit {
    fn clean(&self, side: &str) -> String {
        match &self.boilerplate {
            Some(boilerplate) => boilerplate.replace_all(side, "").trim().to_owned(),
            None => side.trim().to_owned(),
        }
    }
}

impl Heuristic for ComparisonSplit {
    fn name(&self) -> &str {
        "comparison"
    }

    fn candidates(&self, input: &ExtractionInput<'_>) -> Vec<Entity> {
        if input.kind != QueryKind::Comparison {
            return Vec::new();
        }
        let Some(caps) = self
            .split
            .as_ref()
            .and_then(|split| split.captures(input.normalized))
        else {
            return Vec::new();
        };

        [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .map(|side| self.clean(side.as_str()))
            .filter(|name| long_enough(name))
            .map(|name| Entity::new(name, COMPARISON_CONFIDENCE, EntitySource::Comparison))
            .collect()
    }
}

/// Maximal runs of capitalized words, optionally followed by a number.
#[derive(Debug, Clone)]
pub struct CapitalizedPhrase {
    regex: Option<Regex>,
}

impl Default for CapitalizedPhrase {
    fn default() -> Self {
        Self {
            regex: compile(
                r"\b([A-Z][a-zA-Z]*(?:\s+[A-Z][a-zA-Z]*)*(?:\s+\d+)?)\b",
                false,
            ),
        }
    }
}

impl Heuristic for CapitalizedPhrase {
    fn name(&self) -> &str {
        "title_case"
    }

    fn candidates(&self, input: &ExtractionInput<'_>) -> Vec<Entity> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        regex
            .captures_iter(input.raw)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|name| long_enough(name) && !is_stop_word(name))
            .map(|name| Entity::new(name, TITLE_CASE_CONFIDENCE, EntitySource::TitleCase))
            .collect()
    }
}

/// Phrase after an anchor word ("about", "on", "for", "called", "named",
/// "titled") up to `?`, `,`, `.`, `!` or end of text.
///
/// The captured span is at most 31 characters; a longer run without a
/// terminator produces no candidate.
#[derive(Debug, Clone)]
pub struct PrepositionAnchor {
    regex: Option<Regex>,
}

impl Default for PrepositionAnchor {
    fn default() -> Self {
        Self {
            regex: compile(
                r"\b(?:about|on|for|called|named|titled)\s+([A-Za-z0-9][\w\s:'-]{2,30}?)(?:\?|$|,|\.|!)",
                true,
            ),
        }
    }
}

/// Drop stop words from both ends of a phrase.
fn strip_edge_stop_words(phrase: &str) -> String {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let start = words.iter().position(|w| !is_stop_word(w));
    let end = words.iter().rposition(|w| !is_stop_word(w));
    match (start, end) {
        (Some(start), Some(end)) => words
            .get(start..=end)
            .map(|kept| kept.join(" "))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

impl Heuristic for PrepositionAnchor {
    fn name(&self) -> &str {
        "preposition"
    }

    fn candidates(&self, input: &ExtractionInput<'_>) -> Vec<Entity> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        regex
            .captures_iter(input.raw)
            .filter_map(|caps| caps.get(1))
            .map(|m| strip_edge_stop_words(m.as_str()))
            .filter(|name| long_enough(name))
            .map(|name| Entity::new(name, PREPOSITION_CONFIDENCE, EntitySource::Preposition))
            .collect()
    }
}

/// Runs the heuristics in order and ranks their combined output.
pub struct EntityExtractor {
    heuristics: Vec<Box<dyn Heuristic>>,
}

impl std::fmt::Debug for EntityExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityExtractor")
            .field(
                "heuristics",
                &self.heuristics.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    /// Extractor with the built-in heuristics.
    ///
    /// Quoted spans and comparison sides run before capitalized phrases so
    /// that they own a shared name when deduplicating.
    pub fn new() -> Self {
        Self::with_heuristics(vec![
            Box::new(QuotedSpan::default()),
            Box::new(ComparisonSplit::default()),
            Box::new(CapitalizedPhrase::default()),
            Box::new(PrepositionAnchor::default()),
        ])
    }

    /// Extractor over a caller-supplied heuristic list.
    pub fn with_heuristics(heuristics: Vec<Box<dyn Heuristic>>) -> Self {
        Self { heuristics }
    }

    /// Extract ranked, deduplicated entities.
    pub fn extract(&self, input: &ExtractionInput<'_>) -> Vec<Entity> {
        let mut candidates = Vec::new();
        for heuristic in &self.heuristics {
            let found = heuristic.candidates(input);
            debug!(heuristic = heuristic.name(), count = found.len(), "entity heuristic ran");
            candidates.extend(found);
        }
        rank_entities(candidates)
    }
}
