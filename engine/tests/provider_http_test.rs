//! HTTP-level tests for the LLM backends
//!
//! Every test runs against a local wiremock server; no real provider is
//! contacted.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use sahayak_engine::conductor::{LlmHandle, StepError};
use sahayak_engine::llm::{
    ChatCompletionsProvider, LLMError, LLMProvider, OllamaProvider, ProviderKind,
};
use sahayak_engine::secrets::SecretString;

fn ollama(uri: &str, timeout: Duration) -> OllamaProvider {
    OllamaProvider::new(uri, "llama3.2", timeout).unwrap()
}

fn groq(uri: &str, key: Option<&str>) -> ChatCompletionsProvider {
    ChatCompletionsProvider::new(
        ProviderKind::Groq,
        uri,
        "llama-3.3-70b-versatile",
        key.map(SecretString::new),
        Some(0.7),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn chat_response(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_ollama_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "prompt": "system prompt\n\nuser message",
            "stream": false,
            "options": {"num_predict": 42}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "response": "{\"intent\": \"greeting\", \"actions\": []}",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = ollama(&server.uri(), Duration::from_secs(5));
    let content = provider
        .generate("system prompt", "user message", 42)
        .await
        .unwrap();

    assert_eq!(content, "{\"intent\": \"greeting\", \"actions\": []}");
}

#[tokio::test]
async fn test_ollama_server_error_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let provider = ollama(&server.uri(), Duration::from_secs(5));
    match provider.generate("s", "u", 10).await {
        Err(LLMError::ProviderUnavailable(msg)) => assert!(msg.contains("model not loaded")),
        other => panic!("Expected ProviderUnavailable, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_malformed_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = ollama(&server.uri(), Duration::from_secs(5));
    assert!(matches!(
        provider.generate("s", "u", 10).await,
        Err(LLMError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_ollama_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    assert!(ollama(&server.uri(), Duration::from_secs(5)).check_health().await);

    // Nothing listens on the discard port
    assert!(
        !ollama("http://127.0.0.1:9", Duration::from_secs(2))
            .check_health()
            .await
    );
}

#[tokio::test]
async fn test_ollama_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let provider = ollama(&server.uri(), Duration::from_millis(200));
    assert!(matches!(
        provider.generate("s", "u", 10).await,
        Err(LLMError::Timeout)
    ));
}

#[tokio::test]
async fn test_chat_completions_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer gsk_test_key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "max_tokens": 500,
            "messages": [
                {"role": "system", "content": "तुम्ही सहाय्यक आहात"},
                {"role": "user", "content": "नमस्कार"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("नमस्कार!")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = groq(&server.uri(), Some("gsk_test_key"));
    let content = provider
        .generate("तुम्ही सहाय्यक आहात", "नमस्कार", 500)
        .await
        .unwrap();
    assert_eq!(content, "नमस्कार!");
}

#[tokio::test]
async fn test_chat_completions_status_mapping() {
    let cases: [(u16, fn(&LLMError) -> bool); 4] = [
        (401, |e| matches!(e, LLMError::AuthenticationFailed(_))),
        (429, |e| matches!(e, LLMError::RateLimitExceeded)),
        (503, |e| matches!(e, LLMError::ProviderUnavailable(_))),
        (400, |e| matches!(e, LLMError::InvalidRequest(_))),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(status).set_body_string("error"))
            .mount(&server)
            .await;

        let err = groq(&server.uri(), Some("gsk_test_key"))
            .generate("s", "u", 10)
            .await
            .unwrap_err();
        assert!(expected(&err), "status {} mapped to {:?}", status, err);
    }
}

#[tokio::test]
async fn test_chat_completions_error_text_is_scrubbed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string("Invalid API Key: gsk_abcdefghijklmnopqrstuvwxyz0123"),
        )
        .mount(&server)
        .await;

    match groq(&server.uri(), Some("gsk_test_key"))
        .generate("s", "u", 10)
        .await
    {
        Err(LLMError::AuthenticationFailed(msg)) => {
            assert!(!msg.contains("gsk_abcdefghijklmnopqrstuvwxyz0123"));
            assert!(msg.contains("[REDACTED]"));
        }
        other => panic!("Expected AuthenticationFailed, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_chat_completions_without_choices_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    assert!(matches!(
        groq(&server.uri(), Some("gsk_test_key"))
            .generate("s", "u", 10)
            .await,
        Err(LLMError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_missing_key_never_reaches_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("ok")))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        groq(&server.uri(), None).generate("s", "u", 10).await,
        Err(LLMError::AuthenticationFailed(_))
    ));
}

#[tokio::test]
async fn test_llm_handle_deadline_maps_to_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    // Client allows 5s; the handle gives up first
    let provider: Arc<dyn LLMProvider> =
        Arc::new(ollama(&server.uri(), Duration::from_secs(5)));
    let handle = LlmHandle::new(provider, Duration::from_millis(200));

    assert!(matches!(
        handle.complete("s", "u", 10).await,
        Err(StepError::Llm(LLMError::Timeout))
    ));
}
