//! Region and category tagging.
//!
//! Both tables are scanned in declaration order and the first keyword found
//! in the input wins; there is no longest-match preference. Names match as
//! substrings, so a keyword embedded in an unrelated word can still misfire.
//!
//! The short codes `de`, `uk`, `us`, `usa`, `fr`, `pl`, `eu` and `tv` match
//! whole tokens only. A code glued to other letters is never tagged:
//! "crusader" tags neither DE nor US, "ukraine" does not tag GB, "free" does
//! not tag FR, "play" does not tag PL, "queue" does not tag EU and "atv"
//! does not tag TV. A code standing alone between spaces or punctuation, as
//! in "top 5 in de?", still matches.

use tracing::debug;

use crate::types::{Category, Region};

/// How a keyword is located in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Anywhere in the text.
    Substring,
    /// As a complete alphanumeric token.
    Token,
}

/// One entry of a keyword table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule<T> {
    /// Lower-case keyword.
    pub keyword: String,
    /// Value produced on match.
    pub value: T,
    /// Matching mode.
    pub mode: MatchMode,
}

impl<T> KeywordRule<T> {
    /// Substring rule.
    pub fn substring(keyword: &str, value: T) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            value,
            mode: MatchMode::Substring,
        }
    }

    /// Whole-token rule.
    pub fn token(keyword: &str, value: T) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            value,
            mode: MatchMode::Token,
        }
    }

    fn matches(&self, text: &str, tokens: &[&str]) -> bool {
        match self.mode {
            MatchMode::Substring => text.contains(self.keyword.as_str()),
            MatchMode::Token => tokens.iter().any(|t| *t == self.keyword),
        }
    }
}

/// Value of the first rule that matches `text`.
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    let tokens = tokenize(text);
    rules
        .iter()
        .find(|rule| rule.matches(text, &tokens))
        .map(|rule| rule.value)
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Built-in region table.
pub fn default_region_rules() -> Vec<KeywordRule<Region>> {
    vec![
        KeywordRule::token("de", Region::Germany),
        KeywordRule::substring("germany", Region::Germany),
        KeywordRule::substring("german", Region::Germany),
        KeywordRule::token("uk", Region::UnitedKingdom),
        KeywordRule::substring("britain", Region::UnitedKingdom),
        KeywordRule::substring("british", Region::UnitedKingdom),
        KeywordRule::substring("england", Region::UnitedKingdom),
        KeywordRule::token("us", Region::UnitedStates),
        KeywordRule::token("usa", Region::UnitedStates),
        KeywordRule::substring("america", Region::UnitedStates),
        KeywordRule::substring("american", Region::UnitedStates),
        KeywordRule::token("fr", Region::France),
        KeywordRule::substring("france", Region::France),
        KeywordRule::substring("french", Region::France),
        KeywordRule::token("pl", Region::Poland),
        KeywordRule::substring("poland", Region::Poland),
        KeywordRule::substring("polish", Region::Poland),
        KeywordRule::token("eu", Region::Europe),
        KeywordRule::substring("europe", Region::Europe),
        KeywordRule::substring("european", Region::Europe),
    ]
}

/// Built-in category table.
pub fn default_category_rules() -> Vec<KeywordRule<Category>> {
    vec![
        KeywordRule::substring("gaming", Category::Games),
        KeywordRule::substring("games", Category::Games),
        KeywordRule::substring("game", Category::Games),
        KeywordRule::substring("video game", Category::Games),
        KeywordRule::substring("anime", Category::MangaAnime),
        KeywordRule::substring("manga", Category::MangaAnime),
        KeywordRule::substring("movie", Category::Movies),
        KeywordRule::substring("movies", Category::Movies),
        KeywordRule::substring("film", Category::Movies),
        KeywordRule::substring("films", Category::Movies),
        KeywordRule::token("tv", Category::TvSeries),
        KeywordRule::substring("series", Category::TvSeries),
        KeywordRule::substring("show", Category::TvSeries),
        KeywordRule::substring("shows", Category::TvSeries),
    ]
}

/// Region and category detected in one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextTags {
    /// Region filter.
    pub region: Option<Region>,
    /// Category filter.
    pub category: Option<Category>,
}

/// Tagger over a region table and a category table.
#[derive(Debug, Clone)]
pub struct ContextTagger {
    regions: Vec<KeywordRule<Region>>,
    categories: Vec<KeywordRule<Category>>,
}

impl Default for ContextTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextTagger {
    /// Tagger with the built-in tables.
    pub fn new() -> Self {
        Self::with_tables(default_region_rules(), default_category_rules())
    }

    /// Tagger with caller-supplied tables.
    pub fn with_tables(
        regions: Vec<KeywordRule<Region>>,
        categories: Vec<KeywordRule<Category>>,
    ) -> Self {
        Self {
            regions,
            categories,
        }
    }

    /// Tag normalized (lower-cased) text.
    pub fn tag(&self, normalized: &str) -> ContextTags {
        let tags = ContextTags {
            region: first_match(&self.regions, normalized),
            category: first_match(&self.categories, normalized),
        };
        debug!(region = ?tags.region, category = ?tags.category, "tagged query context");
        tags
    }
}
