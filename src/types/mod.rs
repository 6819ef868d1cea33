//! Core types shared by every pipeline stage.
//!
//! [`QueryIntent`] is the record the pipeline produces for one user question.
//! It is rebuilt from scratch for each input and handed downstream by value.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Maximum number of entities carried on a [`QueryIntent`].
pub const MAX_ENTITIES: usize = 3;

/// Confidence assigned when no classifier rule matches.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Closed set of query categories.
///
/// Serialized in `SCREAMING_SNAKE_CASE`, which is also the vocabulary the
/// secondary parser is instructed to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryKind {
    /// Look up everything known about a single title.
    #[default]
    DeepDive,
    /// Side-by-side comparison of two titles.
    Comparison,
    /// How large a fandom or audience is.
    Sizing,
    /// Whether a title is mentioned in the data at all.
    Search,
    /// Upcoming releases.
    Calendar,
    /// Trends scoped to a country or region.
    Regional,
    /// Request for a recommendation or judgement.
    Opinion,
    /// Deals, announcements and other news.
    News,
}

impl QueryKind {
    /// All kinds in declaration order.
    pub const ALL: [QueryKind; 8] = [
        QueryKind::DeepDive,
        QueryKind::Comparison,
        QueryKind::Sizing,
        QueryKind::Search,
        QueryKind::Calendar,
        QueryKind::Regional,
        QueryKind::Opinion,
        QueryKind::News,
    ];

    /// Wire code, e.g. `"DEEP_DIVE"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeepDive => "DEEP_DIVE",
            Self::Comparison => "COMPARISON",
            Self::Sizing => "SIZING",
            Self::Search => "SEARCH",
            Self::Calendar => "CALENDAR",
            Self::Regional => "REGIONAL",
            Self::Opinion => "OPINION",
            Self::News => "NEWS",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a wire code does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} code: {code:?}")]
pub struct UnknownCode {
    /// Which vocabulary was being parsed.
    pub field: &'static str,
    /// The rejected input.
    pub code: String,
}

impl FromStr for QueryKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownCode {
                field: "query_type",
                code: s.to_owned(),
            })
    }
}

/// Region filter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Germany.
    #[serde(rename = "DE")]
    Germany,
    /// United Kingdom. The secondary parser may answer `UK`.
    #[serde(rename = "GB", alias = "UK")]
    UnitedKingdom,
    /// United States.
    #[serde(rename = "US")]
    UnitedStates,
    /// France.
    #[serde(rename = "FR")]
    France,
    /// Poland.
    #[serde(rename = "PL")]
    Poland,
    /// Europe as a whole.
    #[serde(rename = "EU")]
    Europe,
}

impl Region {
    /// ISO-style code, e.g. `"GB"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Germany => "DE",
            Self::UnitedKingdom => "GB",
            Self::UnitedStates => "US",
            Self::France => "FR",
            Self::Poland => "PL",
            Self::Europe => "EU",
        }
    }
}

impl FromStr for Region {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DE" => Ok(Self::Germany),
            "GB" | "UK" => Ok(Self::UnitedKingdom),
            "US" => Ok(Self::UnitedStates),
            "FR" => Ok(Self::France),
            "PL" => Ok(Self::Poland),
            "EU" => Ok(Self::Europe),
            _ => Err(UnknownCode {
                field: "region",
                code: s.to_owned(),
            }),
        }
    }
}

/// Content category filter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Video games.
    Games,
    /// Manga and anime.
    MangaAnime,
    /// Films.
    Movies,
    /// Television series.
    TvSeries,
}

impl Category {
    /// Wire code, e.g. `"MANGA_ANIME"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Games => "GAMES",
            Self::MangaAnime => "MANGA_ANIME",
            Self::Movies => "MOVIES",
            Self::TvSeries => "TV_SERIES",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GAMES" => Ok(Self::Games),
            "MANGA_ANIME" => Ok(Self::MangaAnime),
            "MOVIES" => Ok(Self::Movies),
            "TV_SERIES" => Ok(Self::TvSeries),
            _ => Err(UnknownCode {
                field: "category",
                code: s.to_owned(),
            }),
        }
    }
}

/// Which heuristic (or external parser) produced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    /// Text inside matching quotes.
    Quoted,
    /// A run of capitalized words.
    TitleCase,
    /// Text following an anchor word such as "about".
    Preposition,
    /// One side of an "X vs Y" split.
    Comparison,
    /// Supplied by the secondary parser.
    External,
}

/// A candidate title or IP name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Name as extracted.
    pub name: String,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    /// Producer of this entity.
    pub source: EntitySource,
}

impl Entity {
    /// Create an entity, clamping confidence into [0, 1].
    pub fn new(name: impl Into<String>, confidence: f64, source: EntitySource) -> Self {
        Self {
            name: name.into(),
            confidence: clamp_confidence(confidence),
            source,
        }
    }
}

/// Deduplicate, rank and cap a candidate list.
///
/// The first candidate seen for a lowercase name wins, survivors are sorted
/// by descending confidence (stable, so ties keep encounter order) and at
/// most [`MAX_ENTITIES`] are kept.
pub fn rank_entities(candidates: Vec<Entity>) -> Vec<Entity> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<Entity> = candidates
        .into_iter()
        .filter(|e| seen.insert(e.name.to_lowercase()))
        .collect();
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked.truncate(MAX_ENTITIES);
    ranked
}

/// How the final intent was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Rule-based parse only; the secondary parser was not used.
    #[default]
    RuleOnly,
    /// Rule-based parse merged with a secondary parse.
    LlmEnhanced,
    /// A secondary parse was requested but its response was unusable.
    LlmParseFailed,
}

/// Structured, confidence-scored interpretation of one user question.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    /// Query category.
    pub kind: QueryKind,
    /// Overall confidence in [0, 1].
    pub confidence: f64,
    /// Ranked entities, at most [`MAX_ENTITIES`], distinct by lowercase name.
    pub entities: Vec<Entity>,
    /// Region filter, if any.
    pub region: Option<Region>,
    /// Category filter, if any.
    pub category: Option<Category>,
    /// Label of the classifier rule behind `kind`.
    pub matched_rule: Option<String>,
    /// Trimmed input text.
    pub original_text: String,
    /// How this record was produced.
    pub provenance: Provenance,
}

impl QueryIntent {
    /// Create a rule-only intent with no entities or filters.
    pub fn new(
        kind: QueryKind,
        confidence: f64,
        matched_rule: Option<String>,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            confidence: clamp_confidence(confidence),
            entities: Vec::new(),
            region: None,
            category: None,
            matched_rule,
            original_text: original_text.into(),
            provenance: Provenance::RuleOnly,
        }
    }

    /// Name of the highest-ranked entity.
    pub fn primary_entity(&self) -> Option<&str> {
        self.entities.first().map(|e| e.name.as_str())
    }

    /// Name of the second-ranked entity.
    pub fn secondary_entity(&self) -> Option<&str> {
        self.entities.get(1).map(|e| e.name.as_str())
    }
}

impl Serialize for QueryIntent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QueryIntent", 10)?;
        state.serialize_field("query_type", &self.kind)?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("entities", &self.entities)?;
        state.serialize_field("primary_entity", &self.primary_entity())?;
        state.serialize_field("secondary_entity", &self.secondary_entity())?;
        state.serialize_field("region", &self.region)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("matched_rule", &self.matched_rule)?;
        state.serialize_field("original_text", &self.original_text)?;
        state.serialize_field("provenance", &self.provenance)?;
        state.end()
    }
}

/// Clamp a confidence value into [0, 1]. NaN maps to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
