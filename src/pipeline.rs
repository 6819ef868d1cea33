//! Query pipeline: rule-based parse, escalation decision and optional
//! secondary parse.
//!
//! [`QueryPipeline::parse`] is pure and synchronous. [`QueryPipeline::resolve`]
//! adds the secondary parser behind a timeout; every failure on that path
//! falls back to the rule-based intent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn, Instrument};

use crate::classifier::PatternClassifier;
use crate::escalation::{self, ParseRequest};
use crate::extractors::context::ContextTagger;
use crate::extractors::entity::EntityExtractor;
use crate::extractors::ExtractionInput;
use crate::merger;
use crate::providers::{CompletionRequest, LlmProvider, Message, ProviderError};
use crate::types::QueryIntent;

/// An external interpreter for queries the rules cannot settle.
///
/// Returns the raw response text; validation happens in [`merger`].
#[async_trait]
pub trait SecondaryParser: Send + Sync {
    /// Interpret one query.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when no response could be obtained.
    async fn parse(&self, request: &ParseRequest) -> Result<String, ProviderError>;
}

/// [`SecondaryParser`] backed by an LLM provider.
pub struct LlmSecondaryParser {
    provider: Arc<dyn LlmProvider>,
    max_tokens: u32,
}

impl LlmSecondaryParser {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn LlmProvider>, max_tokens: u32) -> Self {
        Self {
            provider,
            max_tokens,
        }
    }
}

#[async_trait]
impl SecondaryParser for LlmSecondaryParser {
    async fn parse(&self, request: &ParseRequest) -> Result<String, ProviderError> {
        let completion = CompletionRequest {
            messages: vec![Message::user(request.user.clone())],
            system: Some(request.system.to_owned()),
            max_tokens: Some(self.max_tokens),
        };
        let response = self.provider.complete(completion).await?;
        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "secondary parse completed"
        );
        Ok(response.text)
    }
}

/// Classifier, entity extractor and context tagger wired together.
#[derive(Debug, Default)]
pub struct QueryPipeline {
    classifier: PatternClassifier,
    extractor: EntityExtractor,
    tagger: ContextTagger,
}

impl QueryPipeline {
    /// Pipeline with the built-in rule tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline from explicit components.
    pub fn with_components(
        classifier: PatternClassifier,
        extractor: EntityExtractor,
        tagger: ContextTagger,
    ) -> Self {
        Self {
            classifier,
            extractor,
            tagger,
        }
    }

    /// Rule-based parse. Any input, including empty text, yields an intent.
    pub fn parse(&self, raw: &str) -> QueryIntent {
        let raw = raw.trim();
        let normalized = raw.to_lowercase();

        let classification = self.classifier.classify(&normalized);
        let input = ExtractionInput {
            kind: classification.kind,
            raw,
            normalized: &normalized,
        };
        let tags = self.tagger.tag(&normalized);

        let mut intent = QueryIntent::new(
            classification.kind,
            classification.confidence,
            classification.matched_rule,
            raw,
        );
        intent.entities = self.extractor.extract(&input);
        intent.region = tags.region;
        intent.category = tags.category;
        intent
    }

    /// Whether `intent` should go to the secondary parser.
    pub fn needs_escalation(&self, intent: &QueryIntent) -> bool {
        escalation::needs_escalation(intent)
    }

    /// Parse `raw`, escalating to `parser` when warranted.
    ///
    /// Without a parser, or when the call errors or exceeds `timeout`, the
    /// rule-based intent is returned unchanged.
    pub async fn resolve(
        &self,
        raw: &str,
        parser: Option<&dyn SecondaryParser>,
        timeout: Duration,
    ) -> QueryIntent {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("query", %request_id);
        self.resolve_inner(raw, parser, timeout)
            .instrument(span)
            .await
    }

    async fn resolve_inner(
        &self,
        raw: &str,
        parser: Option<&dyn SecondaryParser>,
        timeout: Duration,
    ) -> QueryIntent {
        let intent = self.parse(raw);
        info!(
            kind = %intent.kind,
            confidence = intent.confidence,
            entities = intent.entities.len(),
            "rule-based parse"
        );

        if !self.needs_escalation(&intent) {
            return intent;
        }
        let Some(parser) = parser else {
            debug!("escalation wanted but no secondary parser configured");
            return intent;
        };

        let request = ParseRequest::for_intent(&intent);
        match tokio::time::timeout(timeout, parser.parse(&request)).await {
            Ok(Ok(response)) => {
                let merged = merger::merge(&intent, &response);
                info!(
                    kind = %merged.intent.kind,
                    provenance = ?merged.intent.provenance,
                    "secondary parse merged"
                );
                merged.intent
            }
            Ok(Err(e)) => {
                warn!(error = %e, "secondary parser failed, keeping rule-based intent");
                intent
            }
            Err(_) => {
                warn!(
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "secondary parser timed out, keeping rule-based intent"
                );
                intent
            }
        }
    }
}
