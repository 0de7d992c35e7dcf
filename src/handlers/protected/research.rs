use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::database::models::ResearchPostView;
use crate::error::ApiError;
use crate::handlers::{parse_id, ApiResult};
use crate::middleware::{AuthUser, JsonBody};
use crate::services::research::NewPostRequest;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<ResearchPostView>,
}

/// GET /api/research/posts[?limit=n] - newest first, unbounded without a positive limit
pub async fn posts_get(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FeedQuery>,
) -> ApiResult<FeedResponse> {
    let limit = parse_id(query.limit.as_deref()).map(|l| l as usize);
    let items = state.research.feed(user.user_id, limit).await?;
    Ok(Json(FeedResponse { items }))
}

/// POST /api/research/posts - publish a post authored by the caller
pub async fn posts_post(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<NewPostRequest>,
) -> Result<(StatusCode, Json<ResearchPostView>), ApiError> {
    let post = state.research.create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(post)))
}
