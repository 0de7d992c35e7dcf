mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{TestServer, ADMIN, STUDENT};

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server.client.get(server.url("/api/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!({ "status": "ok" }));
    Ok(())
}

#[tokio::test]
async fn login_returns_token_and_profile() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "Alex@LearnOnline.edu", "password": "student123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert!(!body["token"].as_str().unwrap_or_default().is_empty());
    let expires_at = body["expiresAt"].as_str().unwrap_or_default();
    let expires_at = chrono::DateTime::parse_from_rfc3339(expires_at)?;
    assert!(expires_at > chrono::Utc::now());
    assert_eq!(body["user"]["email"], "alex@learnonline.edu");
    assert!(body["user"].get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    for payload in [
        json!({ "email": "alex@learnonline.edu", "password": "wrong" }),
        json!({ "email": "nobody@learnonline.edu", "password": "student123" }),
    ] {
        let res = server
            .client
            .post(server.url("/api/auth/login"))
            .json(&payload)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.json::<Value>().await?, json!({ "error": "invalid credentials" }));
    }
    Ok(())
}

#[tokio::test]
async fn malformed_login_payload_is_bad_request() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "invalid payload" }));
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_a_valid_bearer_token() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/me")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "missing bearer token" }));

    let (status, body) = server.get("/api/me", "not-a-jwt").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "invalid token" }));
    Ok(())
}

#[tokio::test]
async fn token_from_another_secret_is_invalid() -> Result<()> {
    let issuer = TestServer::spawn_with(|c| c.security.jwt_secret = "other-secret".into()).await?;
    let foreign = issuer.login(STUDENT).await?;

    let server = TestServer::spawn().await?;
    let (status, _) = server.get("/api/me", &foreign).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn me_returns_caller_profile() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login(ADMIN).await?;
    let (status, body) = server.get("/api/me", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["role"], "admin");
    Ok(())
}

#[tokio::test]
async fn preflight_bypasses_auth() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/api/faculty/dashboard"))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "GET")
        .send()
        .await?;
    assert!(res.status().is_success());
    assert!(res.headers().contains_key("access-control-allow-origin"));
    Ok(())
}

#[tokio::test]
async fn unmatched_routes_use_the_error_envelope() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/nowhere")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "not found" }));

    let res = server.client.get(server.url("/api/auth/login")).send().await?;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = res
        .headers()
        .get("allow")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(allow.contains("POST"), "allow header: {}", allow);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "method not allowed" }));
    Ok(())
}
