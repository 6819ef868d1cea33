//! Trendscope — query understanding for entertainment-IP trend questions.
//!
//! Turns a free-form question ("Warframe vs Crusader Kings", "how big is
//! Clair Obscur's fandom?") into a [`types::QueryIntent`]: a query kind, up
//! to three ranked entities, and optional region and category filters.
//! Parsing is rule-based first; inputs the rules cannot settle are escalated
//! to an LLM-backed secondary parser and the two results are merged.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod types;

pub mod classifier;
pub mod escalation;
pub mod extractors;
pub mod merger;
pub mod pipeline;

pub mod adapters;
pub mod providers;

pub mod config;
pub mod credentials;
pub mod logging;
