//! Gemini provider wire format and transport tests.

use serde_json::json;
use trendscope::providers::gemini::{
    build_request, parse_response, GeminiProvider, DEFAULT_GEMINI_URL,
};
use trendscope::providers::{
    CompletionRequest, LlmProvider, Message, ProviderError, Role, StopReason,
};

use crate::server::serve_once;

fn simple_request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user("Parse this query: \"Hades\"")],
        system: Some("You are a query parser.".to_owned()),
        max_tokens: Some(512),
    }
}

#[test]
fn build_request_uses_camel_case_wire_names() {
    let req = build_request(&simple_request());
    let value = match serde_json::to_value(&req) {
        Ok(value) => value,
        Err(err) => panic!("request should serialize: {err}"),
    };
    assert_eq!(
        value["systemInstruction"]["parts"][0]["text"],
        json!("You are a query parser.")
    );
    assert_eq!(value["contents"][0]["role"], json!("user"));
    assert_eq!(value["generationConfig"]["maxOutputTokens"], json!(512));
    assert_eq!(
        value["generationConfig"]["responseMimeType"],
        json!("application/json")
    );
    assert!(value["systemInstruction"].get("role").is_none());
}

#[test]
fn build_request_maps_assistant_to_model() {
    let request = CompletionRequest {
        messages: vec![
            Message::user("hi"),
            Message {
                role: Role::Assistant,
                content: "hello".to_owned(),
            },
        ],
        system: None,
        max_tokens: None,
    };
    let req = build_request(&request);
    assert!(req.system_instruction.is_none());
    assert_eq!(req.contents[0].role.as_deref(), Some("user"));
    assert_eq!(req.contents[1].role.as_deref(), Some("model"));
}

#[test]
fn parse_response_joins_parts() {
    let body = json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "{\"query_type\":"}, {"text": "\"NEWS\"}"}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 12},
        "modelVersion": "gemini-2.0-flash-001"
    });
    let resp = match parse_response(&body.to_string(), "gemini-2.0-flash") {
        Ok(resp) => resp,
        Err(err) => panic!("response should parse: {err}"),
    };
    assert_eq!(resp.text, "{\"query_type\":\"NEWS\"}");
    assert_eq!(resp.stop_reason, StopReason::EndTurn);
    assert_eq!(resp.usage.input_tokens, 40);
    assert_eq!(resp.usage.output_tokens, 12);
    assert_eq!(resp.model, "gemini-2.0-flash-001");
}

#[test]
fn parse_response_max_tokens_and_fallback_model() {
    let body = json!({
        "candidates": [{"content": {"parts": [{"text": "{"}]}, "finishReason": "MAX_TOKENS"}]
    });
    let resp = match parse_response(&body.to_string(), "gemini-2.0-flash") {
        Ok(resp) => resp,
        Err(err) => panic!("response should parse: {err}"),
    };
    assert_eq!(resp.stop_reason, StopReason::MaxTokens);
    assert_eq!(resp.model, "gemini-2.0-flash");
    assert_eq!(resp.usage.input_tokens, 0);
}

#[test]
fn parse_response_without_candidates_is_an_error() {
    let result = parse_response("{\"candidates\":[]}", "m");
    assert!(matches!(result, Err(ProviderError::Parse(_))));
    let result = parse_response("not json", "m");
    assert!(matches!(result, Err(ProviderError::Parse(_))));
}

#[test]
fn debug_output_redacts_api_key() {
    let provider = GeminiProvider::new(
        "gemini/gemini-2.0-flash".to_owned(),
        "gemini-2.0-flash".to_owned(),
        "AIzaSecretValue".to_owned(),
    );
    let rendered = format!("{provider:?}");
    assert!(!rendered.contains("AIzaSecretValue"));
    assert!(rendered.contains("[REDACTED]"));
    assert_eq!(provider.base_url, DEFAULT_GEMINI_URL);
    assert_eq!(provider.model_id(), "gemini/gemini-2.0-flash");
}

#[tokio::test]
async fn complete_against_local_server() {
    let body = json!({
        "candidates": [{"content": {"parts": [{"text": "{\"query_type\":\"SIZING\"}"}]}, "finishReason": "STOP"}]
    })
    .to_string();
    let url = serve_once("200 OK", "application/json", &body).await;

    let mut provider = GeminiProvider::new(
        "gemini/gemini-2.0-flash".to_owned(),
        "gemini-2.0-flash".to_owned(),
        "test-key".to_owned(),
    );
    provider.base_url = url;

    let resp = match provider.complete(simple_request()).await {
        Ok(resp) => resp,
        Err(err) => panic!("completion should succeed: {err}"),
    };
    assert_eq!(resp.text, "{\"query_type\":\"SIZING\"}");
}

#[tokio::test]
async fn complete_surfaces_http_errors() {
    let url = serve_once("403 Forbidden", "application/json", "{\"error\":\"denied\"}").await;
    let mut provider = GeminiProvider::new(
        "gemini/gemini-2.0-flash".to_owned(),
        "gemini-2.0-flash".to_owned(),
        "test-key".to_owned(),
    );
    provider.base_url = url;

    let result = provider.complete(simple_request()).await;
    assert!(matches!(
        result,
        Err(ProviderError::HttpStatus { status: 403, .. })
    ));
}
