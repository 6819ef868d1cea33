//! HTTP response sanitization and truncation tests.

use trendscope::providers::{check_http_response, sanitize_http_error_body, ProviderError};

use crate::server::serve_once;

async fn checked(status_line: &str, body: &str) -> Result<String, ProviderError> {
    let url = serve_once(status_line, "text/plain", body).await;
    let response = match reqwest::get(format!("{url}/")).await {
        Ok(response) => response,
        Err(err) => panic!("request should complete: {err}"),
    };
    check_http_response(response).await
}

#[tokio::test]
async fn success_returns_body() {
    let body = match checked("200 OK", "{\"ok\":true}").await {
        Ok(body) => body,
        Err(err) => panic!("2xx should succeed: {err}"),
    };
    assert_eq!(body, "{\"ok\":true}");
}

#[tokio::test]
async fn check_http_response_redacts_api_keys() {
    let raw_key = "AIzaSyA1234567890abcdefghijklmnopqrs";
    let body = format!("API key not valid: {raw_key}");

    match checked("400 Bad Request", &body).await {
        Err(ProviderError::HttpStatus { status, body }) => {
            assert_eq!(status, 400);
            assert!(!body.contains(raw_key));
            assert!(body.contains("[REDACTED]"));
        }
        Err(other) => panic!("expected http status error, got: {other}"),
        Ok(_) => panic!("response should fail on non-success status"),
    }
}

#[tokio::test]
async fn check_http_response_truncates_long_error_body() {
    let body = "x".repeat(400);

    match checked("500 Internal Server Error", &body).await {
        Err(ProviderError::HttpStatus { body, .. }) => {
            assert!(body.ends_with("...[truncated]"));
        }
        Err(other) => panic!("expected http status error, got: {other}"),
        Ok(_) => panic!("response should fail on non-success status"),
    }
}

#[test]
fn sanitize_collapses_whitespace() {
    assert_eq!(
        sanitize_http_error_body("quota\n\n   exceeded\tfor  project"),
        "quota exceeded for project"
    );
}
