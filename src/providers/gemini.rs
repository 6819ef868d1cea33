//! Gemini provider implementation using the `generateContent` API.

use serde::{Deserialize, Serialize};

use super::{
    check_http_response, CompletionRequest, CompletionResponse, LlmProvider, ProviderError, Role,
    StopReason, UsageStats,
};

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_TOKENS: u32 = 1024;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// `generateContent` request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns.
    pub contents: Vec<GeminiContent>,
    /// Optional system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    /// Generation settings.
    pub generation_config: GeminiGenerationConfig,
}

/// A content block (one turn).
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// "user" or "model"; absent for system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text parts.
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A single text part.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Part text.
    #[serde(default)]
    pub text: String,
}

/// Generation settings.
#[doc(hidden)]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Maximum tokens to generate.
    pub max_output_tokens: u32,
    /// Ask for a JSON body.
    pub response_mime_type: String,
}

/// `generateContent` response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Response candidates; the first is used.
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Token usage.
    #[serde(default)]
    pub usage_metadata: Option<GeminiUsage>,
    /// Model version that served the request.
    #[serde(default)]
    pub model_version: Option<String>,
}

/// One response candidate.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Generated content.
    pub content: Option<GeminiContent>,
    /// Why generation stopped.
    pub finish_reason: Option<String>,
}

/// Gemini usage statistics.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsage {
    /// Input tokens consumed.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Output tokens generated.
    #[serde(default)]
    pub candidates_token_count: u32,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Gemini `generateContent` provider.
#[derive(Clone)]
pub struct GeminiProvider {
    model_spec: String,
    model_name: String,
    api_key: String,
    /// Base URL for the Gemini API.
    #[doc(hidden)]
    pub base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model_spec", &self.model_spec)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider instance.
    pub fn new(model_spec: String, model_name: String, api_key: String) -> Self {
        Self {
            model_spec,
            model_name,
            api_key,
            base_url: DEFAULT_GEMINI_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Gemini API request from a completion request.
#[doc(hidden)]
pub fn build_request(request: &CompletionRequest) -> GeminiRequest {
    let contents = request
        .messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            GeminiContent {
                role: Some(role.to_owned()),
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            }
        })
        .collect();

    let system_instruction = request.system.as_ref().map(|system| GeminiContent {
        role: None,
        parts: vec![GeminiPart {
            text: system.clone(),
        }],
    });

    GeminiRequest {
        contents,
        system_instruction,
        generation_config: GeminiGenerationConfig {
            max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            response_mime_type: "application/json".to_owned(),
        },
    }
}

/// Parse a Gemini API response into a completion response.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized or has
/// no candidates.
#[doc(hidden)]
pub fn parse_response(body: &str, fallback_model: &str) -> Result<CompletionResponse, ProviderError> {
    let resp: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("response has no candidates".to_owned()))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();

    let stop_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => StopReason::EndTurn,
        Some("MAX_TOKENS") => StopReason::MaxTokens,
        Some(other) => StopReason::Other(other.to_owned()),
    };

    let usage = resp
        .usage_metadata
        .map(|u| UsageStats {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        text,
        stop_reason,
        usage,
        model: resp
            .model_version
            .unwrap_or_else(|| fallback_model.to_owned()),
    })
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let api_request = build_request(&request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload, &self.model_name)
    }

    fn model_id(&self) -> &str {
        &self.model_spec
    }
}
