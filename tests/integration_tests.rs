//! Integration tests for ChattyIO.
//!
//! These tests drive the turn orchestrator end to end against a mock
//! completion endpoint and a temporary settings directory.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chattyio::{
    ApiKey, ApiKeyHandle, AppConfig, JsonSettingsStore, OpenAiCompletionClient, Role,
    SettingsStore, TurnOrchestrator, UpdateApiKeyUseCase,
};

async fn mock_endpoint(status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn orchestrator_for(server: &MockServer) -> TurnOrchestrator {
    let client = Arc::new(OpenAiCompletionClient::new("gpt-3.5-turbo", server.uri()));
    let handle = ApiKeyHandle::new(ApiKey::new("sk-test").expect("valid key"));
    TurnOrchestrator::new(client, handle)
}

#[tokio::test]
async fn test_hello_round_trip() {
    let server = mock_endpoint(200, json!({"choices":[{"message":{"content":"Hi!"}}]})).await;
    let mut orchestrator = orchestrator_for(&server);

    let sent = orchestrator.submit("Hello").await.expect("submit");

    assert!(sent);
    assert!(!orchestrator.is_awaiting_response());
    let turns = orchestrator.conversation().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role(), Role::User);
    assert_eq!(turns[0].content(), "Hello");
    assert_eq!(turns[1].role(), Role::Assistant);
    assert_eq!(turns[1].content(), "Hi!");
}

#[tokio::test]
async fn test_empty_choices_becomes_error_turn() {
    let server = mock_endpoint(200, json!({"choices": []})).await;
    let mut orchestrator = orchestrator_for(&server);

    orchestrator.submit("Hello").await.expect("submit");

    let turns = orchestrator.conversation().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role(), Role::Assistant);
    assert!(turns[1].content().starts_with("Error: "));
    assert!(!orchestrator.is_awaiting_response());
}

#[tokio::test]
async fn test_server_error_becomes_error_turn_and_user_can_retry() {
    let server = mock_endpoint(500, json!({"error": "boom"})).await;
    let mut orchestrator = orchestrator_for(&server);

    orchestrator.submit("first").await.expect("submit");
    orchestrator.submit("again").await.expect("submit");

    let turns = orchestrator.conversation().turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[1].content(), "Error: API error (status 500)");
    assert_eq!(turns[3].content(), "Error: API error (status 500)");
}

#[tokio::test]
async fn test_each_request_carries_full_history() {
    let server = mock_endpoint(200, json!({"choices":[{"message":{"content":"ok"}}]})).await;
    let mut orchestrator = orchestrator_for(&server);

    orchestrator.submit("one").await.expect("submit");
    orchestrator.submit("two").await.expect("submit");
    orchestrator.submit("three").await.expect("submit");

    let requests = server.received_requests().await.expect("recording enabled");
    let sizes: Vec<usize> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = r.body_json().expect("json body");
            body["messages"].as_array().map(|m| m.len()).unwrap_or(0)
        })
        .collect();
    assert_eq!(sizes, vec![1, 3, 5]);
}

#[tokio::test]
async fn test_blank_submission_never_hits_the_network() {
    let server = mock_endpoint(200, json!({"choices":[{"message":{"content":"ok"}}]})).await;
    let mut orchestrator = orchestrator_for(&server);

    assert!(!orchestrator.submit("  \n ").await.expect("submit"));

    assert!(orchestrator.conversation().is_empty());
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_key_update_applies_to_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(wiremock::matchers::header("authorization", "Bearer sk-rotated"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices":[{"message":{"content":"rotated"}}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = AppConfig::path_in(dir.path());
    let store = Arc::new(JsonSettingsStore::new(&config_path));

    let mut orchestrator = orchestrator_for(&server);
    let settings = UpdateApiKeyUseCase::new(store.clone(), orchestrator.api_key().clone());
    settings.execute("sk-rotated").await.expect("update key");

    orchestrator.submit("hi").await.expect("submit");

    assert_eq!(
        orchestrator.conversation().last().map(|t| t.content()),
        Some("rotated")
    );
    assert_eq!(
        store.load_api_key().await.expect("stored key").expose(),
        "sk-rotated"
    );
}

#[tokio::test]
async fn test_config_file_drives_client_construction() {
    let server = mock_endpoint(200, json!({"choices":[{"message":{"content":"configured"}}]})).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = AppConfig::path_in(dir.path());
    std::fs::write(
        &config_path,
        json!({ "api_key": "sk-file", "base_url": server.uri(), "max_tokens": 32 }).to_string(),
    )
    .expect("write config");

    let config = AppConfig::load(&config_path).expect("load config");
    let client = OpenAiCompletionClient::new(config.model(), config.base_url())
        .with_max_tokens(config.max_tokens());
    let handle = ApiKeyHandle::new(config.api_key().expect("api key"));
    let mut orchestrator = TurnOrchestrator::new(Arc::new(client), handle);

    orchestrator.submit("hi").await.expect("submit");

    assert_eq!(
        orchestrator.conversation().last().map(|t| t.content()),
        Some("configured")
    );
}
