//! Deterministic extractors that populate a [`crate::types::QueryIntent`].
//!
//! - [`entity`]: four independent entity heuristics feeding one ranking stage
//! - [`context`]: region and category tagging from ordered keyword tables
//!
//! Extractors never fail. No match means an empty or absent result.

use crate::types::{Entity, QueryKind};

pub mod context;
pub mod entity;

/// Text views handed to every entity heuristic.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    /// Kind chosen by the classifier.
    pub kind: QueryKind,
    /// Trimmed input in its original case.
    pub raw: &'a str,
    /// Trimmed, lower-cased input.
    pub normalized: &'a str,
}

/// An independent producer of entity candidates.
pub trait Heuristic: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Candidates found in the input, in encounter order.
    fn candidates(&self, input: &ExtractionInput<'_>) -> Vec<Entity>;
}

/// Function words and domain filler that never count as entities.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "can",
    "about", "more", "tell", "me", "what", "how", "why", "when", "where", "which", "who",
    "think", "you", "your", "opinion", "take", "thoughts", "of", "on", "in", "to", "for",
    "with", "that", "this", "it", "its", "any", "some", "trend", "trends", "trending", "big",
    "size", "fandom", "game", "games", "movie", "movies", "show", "shows", "series", "anime",
    "upcoming", "release", "mention", "mentions", "search", "find", "look", "up", "we",
    "invest", "worth", "good", "bad", "best", "top", "popular", "and", "or", "vs",
];

/// Whether a word (any case) is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str())
}
