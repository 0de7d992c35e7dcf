mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::json;

use common::{FakeGemini, TestServer, STUDENT};

async fn server_for(fake: &FakeGemini) -> Result<TestServer> {
    let base_url = fake.base_url.clone();
    TestServer::spawn_with(move |config| config.ai.base_url = base_url).await
}

#[tokio::test]
async fn unknown_models_fall_back_in_order() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let server = server_for(&fake).await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "  What is entropy?  " }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "response": "gemini-1.5-flash-002 says: What is entropy?" }));
    assert_eq!(
        fake.calls(),
        vec![
            "v1beta/gemini-1.5-flash-latest",
            "v1/gemini-1.5-flash-latest",
            "v1beta/gemini-1.5-flash-002",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn configured_model_is_tried_first() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let base_url = fake.base_url.clone();
    let server = TestServer::spawn_with(move |config| {
        config.ai.base_url = base_url;
        config.ai.model = "gemini-1.5-pro-001".to_string();
    })
    .await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "hi" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "gemini-1.5-pro-001 says: hi");
    assert_eq!(fake.calls(), vec!["v1beta/gemini-1.5-pro-001"]);
    Ok(())
}

#[tokio::test]
async fn blank_message_is_rejected_before_any_call() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let server = server_for(&fake).await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "   " }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "message is required" }));
    assert!(fake.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn provider_refusals_surface_as_errors() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let server = server_for(&fake).await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "something forbidden" }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "gemini blocked the prompt (safety)" }));

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "silence please" }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "gemini refused to answer due to safety settings" })
    );
    Ok(())
}

#[tokio::test]
async fn non_fallback_failure_stops_the_walk() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let server = server_for(&fake).await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "please explode" }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "gemini API error (v1beta 500 INTERNAL): backend exploded" })
    );
    assert_eq!(fake.calls().len(), 3);
    Ok(())
}

#[tokio::test]
async fn request_key_overrides_configured_key() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let server = server_for(&fake).await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post(
            "/api/ai/chat",
            &token,
            json!({ "message": "hello", "apiKey": "bad-key" }),
        )
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "gemini API error (v1beta 400 INVALID_ARGUMENT): API key not valid" })
    );
    assert_eq!(fake.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_key_without_override() -> Result<()> {
    let fake = FakeGemini::spawn().await?;
    let base_url = fake.base_url.clone();
    let server = TestServer::spawn_with(move |config| {
        config.ai.base_url = base_url;
        config.ai.api_key = String::new();
    })
    .await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "hello" }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "AI provider key is not configured" }));
    assert!(fake.calls().is_empty());

    let (status, body) = server
        .post(
            "/api/ai/chat",
            &token,
            json!({ "message": "hello", "apiKey": "per-request" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "gemini-1.5-flash-002 says: hello");
    Ok(())
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() -> Result<()> {
    let port = portpicker::pick_unused_port().context("no free port")?;
    let server = TestServer::spawn_with(move |config| {
        config.ai.base_url = format!("http://127.0.0.1:{}", port);
    })
    .await?;
    let token = server.login(STUDENT).await?;

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "hello" }))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap_or_default();
    assert!(message.starts_with("gemini transport error"), "{}", message);
    Ok(())
}
