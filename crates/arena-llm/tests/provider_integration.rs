//! Integration tests for provider construction and calls
//!
//! Tests that hit real APIs are marked with #[ignore] and require keys:
//! - OPENAI_API_KEY for OpenAI tests
//! - ANTHROPIC_API_KEY for Anthropic tests
//!
//! Request shapes are checked against a local wiremock server.
//!
//! Run with: cargo test -p arena-llm --test provider_integration -- --ignored

use std::sync::Arc;

use arena_core::{Conversation, Role};
use arena_llm::{
    AnthropicProvider, ArenaConfig, ChatProvider, ChatRequest, GoogleProvider, LlmError,
    MockProvider, OpenAICompatibleProvider, ProviderRegistry,
};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Registry built from a config whose providers all point at `server`
fn registry_for(server: &MockServer) -> ProviderRegistry {
    let config = json!({
        "providers": {
            "openai": {
                "apiKey": "test-key",
                "endpoint": server.uri(),
                "models": [{ "id": "gpt-4o-mini", "maxTokens": 512 }]
            },
            "anthropic": {
                "apiKey": "test-key",
                "endpoint": server.uri(),
                "models": [{ "id": "claude-3-5-haiku-20241022" }]
            },
            "google": {
                "apiKey": "test-key",
                "endpoint": server.uri(),
                "models": [{ "id": "gemini-1.5-flash", "maxTokens": 128 }]
            }
        }
    });
    ArenaConfig::parse(&config.to_string(), |_| None)
        .unwrap()
        .build_registry()
}

#[tokio::test]
async fn test_registry_resolves_and_chats_through_mock() {
    let config = ArenaConfig::parse(r#"{ "providers": { "mock": {} } }"#, |_| None).unwrap();
    let registry = config.build_registry();

    let (provider, model) = registry.resolve("mock").await.unwrap();
    assert_eq!(model, "mock-model-1");

    let conv = Conversation::from_prompt("it-1", "Please summarize the plan");
    let response = provider.chat(ChatRequest::new(conv, &model)).await.unwrap();

    assert!(response.output_text.starts_with("Summary:"));
    assert_eq!(response.conversation.messages.len(), 2);
    assert_eq!(response.conversation.messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_each_chat_gets_its_own_copy() {
    let mock = Arc::new(MockProvider::constant("reply"));
    let registry = ProviderRegistry::new().with(mock.clone());
    let provider = registry.get("mock").unwrap();

    let seed = Conversation::from_prompt("shared", "question");
    let a = provider.chat(ChatRequest::new(seed.clone(), "m")).await.unwrap();
    let b = provider.chat(ChatRequest::new(seed.clone(), "m")).await.unwrap();

    assert_eq!(seed.len(), 1);
    assert_eq!(a.conversation.len(), 2);
    assert_eq!(b.conversation.len(), 2);
}

#[tokio::test]
async fn test_openai_request_uses_configured_max_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini", "max_tokens": 512 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "4" } }],
            "usage": { "prompt_tokens": 9, "completion_tokens": 1, "total_tokens": 10 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, model) = registry_for(&server).resolve("openai").await.unwrap();
    let response = provider
        .chat(ChatRequest::new(Conversation::from_prompt("w-1", "2+2?"), &model))
        .await
        .unwrap();

    assert_eq!(response.output_text, "4");
    assert_eq!(response.usage.unwrap().total, 10);
    assert_eq!(response.conversation.last_message_content(), "4");
}

#[tokio::test]
async fn test_explicit_max_tokens_beats_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "max_tokens": 16 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = registry_for(&server).get("openai").unwrap();
    let request = ChatRequest::new(Conversation::from_prompt("w-2", "hi"), "gpt-4o-mini")
        .with_max_tokens(16);
    let response = provider.chat(request).await.unwrap();
    assert_eq!(response.output_text, "ok");
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn test_anthropic_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-haiku-20241022",
            "max_tokens": 4096,
            "system": "be brief"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "hello" }],
            "usage": { "input_tokens": 5, "output_tokens": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, model) = registry_for(&server).resolve("anthropic").await.unwrap();
    let request = ChatRequest::new(Conversation::from_prompt("w-3", "greet me"), &model)
        .with_system(Some("be brief".to_string()));
    let response = provider.chat(request).await.unwrap();

    assert_eq!(response.output_text, "hello");
    assert_eq!(response.usage.unwrap().total, 6);
}

#[tokio::test]
async fn test_google_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "greet me" }] }],
            "systemInstruction": { "parts": [{ "text": "be brief" }] },
            "generationConfig": { "maxOutputTokens": 128 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "hi there" }] } }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 2, "totalTokenCount": 9 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (provider, model) = registry_for(&server).resolve("google").await.unwrap();
    assert_eq!(provider.name(), "google");
    let request = ChatRequest::new(Conversation::from_prompt("w-4", "greet me"), &model)
        .with_system(Some("be brief".to_string()));
    let response = provider.chat(request).await.unwrap();

    assert_eq!(response.output_text, "hi there");
    assert_eq!(response.usage.unwrap().total, 9);
    assert_eq!(response.conversation.messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn test_google_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new("test-key").with_base_url(&server.uri());
    let err = provider.ask("gemini-1.5-flash", "hi").await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimited));
}

#[tokio::test]
#[ignore = "Requires OPENAI_API_KEY"]
async fn test_openai_real_request() {
    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set for this test");
    let provider = OpenAICompatibleProvider::openai(&api_key);

    let request = ChatRequest::new(
        Conversation::from_prompt("real", "What is 2 + 2? Answer with just the number."),
        "gpt-4o-mini",
    )
    .with_temperature(0.0)
    .with_max_tokens(10);

    let response = provider.chat(request).await.expect("request should succeed");
    assert!(response.output_text.contains('4'));
    assert!(response.usage.is_some());
}

#[tokio::test]
#[ignore = "Requires ANTHROPIC_API_KEY"]
async fn test_anthropic_real_request() {
    let api_key =
        std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY must be set for this test");
    let provider = AnthropicProvider::new(&api_key);

    let reply = provider
        .ask("claude-3-5-haiku-20241022", "Say 'hello' in one word")
        .await
        .expect("request should succeed");
    assert!(!reply.is_empty());
}

#[tokio::test]
#[ignore = "Makes real API call"]
async fn test_invalid_api_key() {
    let provider = OpenAICompatibleProvider::openai("invalid-key-12345");
    let response = provider.ask("gpt-4o-mini", "Hello").await;
    assert!(response.is_err(), "Should fail with invalid key");
}
