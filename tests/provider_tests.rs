//! OpenAI-compatible provider tests against a mock HTTP server

use consultant::models::{CompletionRequest, ModelName};
use consultant::providers::{OpenAIProvider, Provider};
use consultant::services::{classify, FailureKind};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

fn chat_request() -> consultant::models::openai::ChatCompletionRequest {
    CompletionRequest::new("What is a mutex?", ModelName::Llama3_8b).to_chat_request()
}

#[tokio::test]
async fn test_successful_completion() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer gsk_one")
                .json_body_partial(r#"{"model": "llama3-8b-8192", "stream": false}"#);
            then.status(200).json_body(json!({
                "id": "chatcmpl-1",
                "model": "llama3-8b-8192",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "A mutual exclusion lock."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 6, "total_tokens": 18}
            }));
        })
        .await;

    let provider = OpenAIProvider::new(server.base_url()).unwrap();
    let response = provider.chat_complete(&chat_request(), "gsk_one").await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.first_content(), "A mutual exclusion lock.");
    assert_eq!(response.total_tokens(), 18);
}

#[tokio::test]
async fn test_rate_limit_body_is_structured() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).json_body(json!({
                "error": {
                    "message": "Rate limit reached for model `llama3-8b-8192`. Please try again in 1.5s.",
                    "type": "tokens",
                    "code": "rate_limit_exceeded"
                }
            }));
        })
        .await;

    let provider = OpenAIProvider::new(server.base_url()).unwrap();
    let err = provider.chat_complete(&chat_request(), "gsk_one").await.unwrap_err();

    assert_eq!(err.status, Some(429));
    assert_eq!(err.code.as_deref(), Some("rate_limit_exceeded"));
    assert_eq!(
        classify(&err),
        FailureKind::RateLimit {
            retry_after: Some(Duration::from_millis(1500))
        }
    );
}

#[tokio::test]
async fn test_retry_after_header_wins() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429)
                .header("Retry-After", "4")
                .body("Too Many Requests, try again in 9s");
        })
        .await;

    let provider = OpenAIProvider::new(server.base_url()).unwrap();
    let err = provider.chat_complete(&chat_request(), "gsk_one").await.unwrap_err();

    assert_eq!(err.retry_after, Some(Duration::from_secs(4)));
    assert_eq!(
        classify(&err),
        FailureKind::RateLimit {
            retry_after: Some(Duration::from_secs(4))
        }
    );
}

#[tokio::test]
async fn test_service_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("Service Unavailable");
        })
        .await;

    let provider = OpenAIProvider::new(server.base_url()).unwrap();
    let err = provider.chat_complete(&chat_request(), "gsk_one").await.unwrap_err();

    assert_eq!(err.status, Some(503));
    assert_eq!(classify(&err), FailureKind::ServerError);
}

#[tokio::test]
async fn test_auth_failure_is_unclassified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).json_body(json!({
                "error": {"message": "Invalid API Key", "type": "invalid_request_error", "code": "invalid_api_key"}
            }));
        })
        .await;

    let provider = OpenAIProvider::new(server.base_url()).unwrap();
    let err = provider.chat_complete(&chat_request(), "bad").await.unwrap_err();

    assert_eq!(err.to_string(), "Error code: 401 (invalid_api_key) - Invalid API Key");
    assert_eq!(classify(&err), FailureKind::Unclassified);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Nothing listens on the discard port
    let provider = OpenAIProvider::with_timeout("http://127.0.0.1:9", 2).unwrap();
    let err = provider.chat_complete(&chat_request(), "gsk_one").await.unwrap_err();

    assert_eq!(err.status, None);
    assert!(err.message.starts_with("Failed to send request"));
}
