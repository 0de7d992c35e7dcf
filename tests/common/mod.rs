#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use learnonline_api::config::AppConfig;
use learnonline_api::database::{seed, MemoryStore, Store};
use learnonline_api::{app, AppState};

pub const STUDENT: (&str, &str) = ("alex@learnonline.edu", "student123");
pub const OTHER_STUDENT: (&str, &str) = ("jordan@learnonline.edu", "student123");
pub const FACULTY: (&str, &str) = ("meera@learnonline.edu", "faculty123");
pub const ADMIN: (&str, &str) = ("admin@learnonline.edu", "admin123");

/// Router over a freshly seeded in-memory store, served on a free local port.
/// Each test gets its own server; nothing is shared between tests.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();

        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        config.ai.api_key = "test-key".to_string();
        config.ai.timeout_secs = 5;
        configure(&mut config);

        let store = Arc::new(MemoryStore::new());
        seed::seed_sample_data(store.as_ref(), config.security.bcrypt_cost).await?;

        let shared: Arc<dyn Store> = store.clone();
        let state = AppState::new(config, shared)?;
        let base_url = serve(app(state)).await?;

        Ok(Self {
            base_url,
            store,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn login(&self, (email, password): (&str, &str)) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }
}

async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

/// Stand-in for the generative-language API.
///
/// * `gemini-1.5-flash-latest` is unknown (404 on every version)
/// * any other model echoes the prompt, except:
///   a prompt containing `forbidden` is blocked, `silence` yields a blank
///   safety-stopped candidate and `explode` answers 500
/// * key `bad-key` is rejected with 400
pub struct FakeGemini {
    pub base_url: String,
    pub calls: Arc<Mutex<Vec<String>>>,
}

#[derive(Clone)]
struct FakeState {
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeGemini {
    pub async fn spawn() -> Result<Self> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/:version/models/:target", post(fake_generate))
            .with_state(FakeState {
                calls: calls.clone(),
            });
        let base_url = serve(router).await?;
        Ok(Self { base_url, calls })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

async fn fake_generate(
    State(state): State<FakeState>,
    Path((version, target)): Path<(String, String)>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let model = target.trim_end_matches(":generateContent").to_string();
    if let Ok(mut calls) = state.calls.lock() {
        calls.push(format!("{}/{}", version, model));
    }

    if query.get("key").map(String::as_str) == Some("bad-key") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } })),
        );
    }
    if model == "gemini-1.5-flash-latest" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": 404, "message": "model not found", "status": "NOT_FOUND" } })),
        );
    }

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    if prompt.contains("explode") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "code": 500, "message": "backend exploded", "status": "INTERNAL" } })),
        );
    }
    if prompt.contains("forbidden") {
        return (
            StatusCode::OK,
            Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })),
        );
    }
    if prompt.contains("silence") {
        return (
            StatusCode::OK,
            Json(json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "SAFETY" }] })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": format!("{} says: ", model) }, { "text": prompt }] },
                "finishReason": "STOP"
            }]
        })),
    )
}
