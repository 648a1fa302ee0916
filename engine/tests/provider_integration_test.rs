//! Integration tests for the LLM providers
//!
//! Each test runs against a wiremock server, so no model server is needed.

use quill_engine::config::OpenAIConfig;
use quill_engine::llm::{ollama::OllamaProvider, openai::OpenAIProvider, LLMError, LLMProvider, Message};
use quill_engine::pipeline::templates::find_builtin;
use quill_engine::pipeline::{GenerationRequest, Pipeline, PipelineSettings, Stage};
use quill_sdk::errors::ErrorKind;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn ollama_reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.1:8b",
        "created_at": "2024-01-01T00:00:00Z",
        "message": {"role": "assistant", "content": content},
        "done": true
    })
}

fn openai_provider(server: &MockServer, api_key: Option<&str>) -> OpenAIProvider {
    let config = OpenAIConfig {
        base_url: format!("{}/v1", server.uri()),
        model: "gpt-4o-mini".to_string(),
        api_key_env: "QUILL_TEST_KEY".to_string(),
    };
    OpenAIProvider::new(config, api_key.map(str::to_string), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_ollama_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "llama3.1:8b", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("Hola")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(mock_server.uri(), "llama3.1:8b").unwrap();
    let reply = provider
        .complete(&[Message::system("Translate"), Message::user("Hello")])
        .await
        .unwrap();

    assert_eq!(reply, "Hola");
}

#[tokio::test]
async fn test_ollama_server_error_is_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(mock_server.uri(), "llama3.1:8b").unwrap();
    let err = provider.complete(&[Message::user("Hello")]).await.unwrap_err();

    match err {
        LLMError::ProviderUnavailable(msg) => assert!(msg.contains("model not loaded")),
        other => panic!("Expected ProviderUnavailable, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_connection_error() {
    // Nothing listens on port 1
    let provider = OllamaProvider::new("http://127.0.0.1:1", "llama3.1:8b").unwrap();

    let err = provider.complete(&[Message::user("Hello")]).await.unwrap_err();
    match err {
        LLMError::ProviderUnavailable(msg) => assert!(msg.contains("Cannot connect to Ollama")),
        LLMError::NetworkError(_) => {
            // Also acceptable - network errors can manifest differently
        }
        other => panic!("Expected ProviderUnavailable or NetworkError, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let healthy = OllamaProvider::new(mock_server.uri(), "llama3.1:8b").unwrap();
    assert!(healthy.check_health().await);

    let unreachable = OllamaProvider::new("http://127.0.0.1:1", "llama3.1:8b").unwrap();
    assert!(!unreachable.check_health().await);
}

#[tokio::test]
async fn test_openai_completion_sends_bearer_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Bonjour"}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = openai_provider(&mock_server, Some("test-key"));
    let reply = provider.complete(&[Message::user("Hello")]).await.unwrap();

    assert_eq!(reply, "Bonjour");
}

#[tokio::test]
async fn test_openai_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer bad-key"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer busy-key"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let unauthorized = openai_provider(&mock_server, Some("bad-key"))
        .complete(&[Message::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(unauthorized, LLMError::AuthenticationFailed(_)));

    let limited = openai_provider(&mock_server, Some("busy-key"))
        .complete(&[Message::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(limited, LLMError::RateLimitExceeded));
}

#[tokio::test]
async fn test_openai_empty_choices_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let err = openai_provider(&mock_server, Some("test-key"))
        .complete(&[Message::user("Hello")])
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_pipeline_generate_over_http() {
    let mock_server = MockServer::start().await;

    let draft = "Here is your post:\n```json\n{\"hook\": \"Ship faster\", \"body\": \"CI in half the time.\", \"call_to_action\": \"Try it\", \"hashtags\": [\"#ci\"]}\n```";
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply(draft)))
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OllamaProvider::new(mock_server.uri(), "llama3.1:8b").unwrap());
    let pipeline = Pipeline::new(provider, PipelineSettings::default());

    let state = pipeline
        .generate(
            GenerationRequest::new("Announce our CI product"),
            find_builtin("social_post").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(state.stage, Stage::Generated);
    let draft = state.draft_value().unwrap();
    assert_eq!(draft["hook"], "Ship faster");
}

#[tokio::test]
async fn test_pipeline_surfaces_http_failure_as_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let provider = Arc::new(OllamaProvider::new(mock_server.uri(), "llama3.1:8b").unwrap());
    let pipeline = Pipeline::new(provider, PipelineSettings::default());

    let err = pipeline
        .generate(
            GenerationRequest::new("Announce our CI product"),
            find_builtin("social_post").unwrap(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}
