// handlers/protected/student.rs - quests, polls, profiles, leaderboard, student dashboard

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{PollView, PublicUser, QuestView};
use crate::handlers::{parse_id, ApiResult};
use crate::middleware::{AuthUser, JsonBody};
use crate::services::leaderboard::LeaderboardEntry;
use crate::services::student::{CompleteQuestRequest, StudentDashboard, VoteRequest};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

/// GET /api/user/:id
pub async fn user_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<PublicUser> {
    // Unparseable ids match no user.
    let user_id = parse_id(Some(&id)).unwrap_or_default();
    Ok(Json(state.students.user(caller.user_id, caller.role, user_id).await?))
}

/// GET /api/quests[?user_id=n]
pub async fn quests_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<QuestView>> {
    let target = parse_id(query.user_id.as_deref());
    Ok(Json(state.students.quests(caller.user_id, caller.role, target).await?))
}

/// POST /api/quests/:id/complete - body `{"user_id"?}`
pub async fn quest_complete_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    body: Option<JsonBody<CompleteQuestRequest>>,
) -> ApiResult<Value> {
    let quest_id = parse_id(Some(&id)).unwrap_or_default();
    let request = body.map(|JsonBody(r)| r).unwrap_or_default();
    let coins = state
        .students
        .complete_quest(caller.user_id, caller.role, quest_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "coins": coins })))
}

/// GET /api/polls
pub async fn polls_get(State(state): State<AppState>) -> ApiResult<Vec<PollView>> {
    Ok(Json(state.students.polls().await?))
}

/// POST /api/polls/:id/vote - body `{"option_index": n}`
pub async fn poll_vote_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<VoteRequest>,
) -> ApiResult<Value> {
    let poll_id = parse_id(Some(&id)).unwrap_or_default();
    state.students.vote(caller.user_id, poll_id, request).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<String>,
}

/// GET /api/leaderboard[?limit=n] - users by coins, descending
pub async fn leaderboard_get(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    let limit = parse_id(query.limit.as_deref()).map(|l| l as usize);
    Ok(Json(state.students.leaderboard(limit).await?))
}

/// GET /api/student/dashboard[?user_id=n] - admins may look at any student
pub async fn dashboard_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<StudentDashboard> {
    let target = parse_id(query.user_id.as_deref());
    Ok(Json(state.students.dashboard(caller.user_id, caller.role, target).await?))
}
