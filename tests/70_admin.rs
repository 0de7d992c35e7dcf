mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{TestServer, ADMIN, STUDENT};

#[tokio::test]
async fn overview_totals_and_activity() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login(ADMIN).await?;

    let (status, body) = server.get("/api/admin/overview", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["totals"],
        json!({ "users": 7, "students": 5, "faculty": 1, "activeQuests": 4 })
    );
    assert_eq!(body["averageCoins"], 9707);
    assert_eq!(body["leaderboard"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["leaderboard"][0]["name"], "Jordan Lee");

    let activity = body["recentActivity"].as_array().cloned().unwrap_or_default();
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0]["userName"], "Jordan Lee");
    assert_eq!(activity[0]["questTitle"], "Review 3 Peer Submissions");
    assert_eq!(activity[1]["userName"], "Alex Sharma");
    Ok(())
}

#[tokio::test]
async fn new_completions_lead_recent_activity() -> Result<()> {
    let server = TestServer::spawn().await?;
    let student = server.login(STUDENT).await?;
    let admin = server.login(ADMIN).await?;

    server.post("/api/quests/3/complete", &student, json!({})).await?;

    let (_, body) = server.get("/api/admin/overview", &admin).await?;
    assert_eq!(body["recentActivity"][0]["userName"], "Alex Sharma");
    assert_eq!(
        body["recentActivity"][0]["questTitle"],
        "Participate in Forum Discussion"
    );
    assert_eq!(body["averageCoins"], (67950 + 25) / 7);
    Ok(())
}
