//! LLM provider abstraction layer for the secondary parser.
//!
//! Defines the [`LlmProvider`] trait and the shared request/response types
//! used by all provider implementations.
//!
//! Two providers are implemented:
//! - [`gemini::GeminiProvider`] — Google `generateContent` API
//! - [`ollama::OllamaProvider`] — Ollama `/api/chat` API
//!
//! [`build_provider`] instantiates one from a `<provider>/<model>` spec.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ParserConfig;
use crate::credentials::Credentials;

pub mod gemini;
pub mod ollama;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human user message.
    User,
    /// Assistant (LLM) message.
    Assistant,
}

/// A text message in a conversation with an LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message author.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// A request to an LLM provider for a completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation including the latest user message.
    pub messages: Vec<Message>,
    /// System prompt (injected before messages).
    pub system: Option<String>,
    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,
}

/// The reason a completion stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Normal end of turn.
    EndTurn,
    /// Max token limit reached.
    MaxTokens,
    /// Provider-specific other reason.
    Other(String),
}

/// Usage statistics for a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UsageStats {
    /// Tokens used in the prompt/input.
    pub input_tokens: u32,
    /// Tokens generated in the response.
    pub output_tokens: u32,
}

/// The response from an LLM provider.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text.
    pub text: String,
    /// Why the model stopped.
    pub stop_reason: StopReason,
    /// Token usage.
    pub usage: UsageStats,
    /// The model identifier that served this response.
    pub model: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by model providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Provider cannot satisfy the request with current configuration.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure, `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace, redact key-like tokens and truncate an error body.
pub fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"AIza[0-9A-Za-z_\-]{20,}",
        r"sk-[A-Za-z0-9]{32,}",
        r"xoxb-[A-Za-z0-9\-]{20,}",
        r"xoxp-[A-Za-z0-9\-]{20,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Core LLM provider interface.
///
/// Implementations must be `Send + Sync` so one provider can serve
/// concurrent pipeline invocations.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Request a completion from the LLM.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on API, network, or parse failure.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    /// The model spec this provider is instantiated for.
    fn model_id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Parse a provider string like `"gemini/gemini-2.0-flash"` into components.
///
/// Returns `(provider_name, model_name)`.
///
/// # Errors
///
/// Returns an error if the string does not contain a `/` separator or either
/// side is empty.
pub fn parse_provider_string(s: &str) -> anyhow::Result<(&str, &str)> {
    let (provider, model) = s.split_once('/').ok_or_else(|| {
        anyhow::anyhow!("invalid provider string: {s:?}, expected format 'provider/model'")
    })?;
    if provider.is_empty() || model.is_empty() {
        anyhow::bail!("invalid provider string: {s:?}, both provider and model must be non-empty");
    }
    Ok((provider, model))
}

/// Instantiate the provider named by `config.model`.
///
/// # Errors
///
/// Returns an error for a malformed spec, an unsupported provider, or a
/// missing API key.
pub fn build_provider(
    config: &ParserConfig,
    credentials: &Credentials,
) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let (provider, model) = parse_provider_string(&config.model)?;
    match provider {
        "gemini" => {
            let api_key = credentials.require(&config.api_key_env)?;
            Ok(Arc::new(gemini::GeminiProvider::new(
                config.model.clone(),
                model.to_owned(),
                api_key,
            )))
        }
        "ollama" => {
            let mut ollama = ollama::OllamaProvider::new(config.model.clone(), model.to_owned());
            if let Some(url) = &config.ollama_url {
                ollama.base_url = url.trim_end_matches('/').to_owned();
            }
            Ok(Arc::new(ollama))
        }
        other => anyhow::bail!("unsupported provider '{other}' in model spec '{}'", config.model),
    }
}
