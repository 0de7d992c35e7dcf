use axum::{extract::State, Json};

use crate::handlers::ApiResult;
use crate::middleware::{AuthUser, JsonBody};
use crate::services::ai_chat::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// POST /api/ai/chat - forward one message to the tutor model
///
/// Provider failures come back as 500 with the provider's message.
pub async fn chat_post(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<ChatRequest>,
) -> ApiResult<ChatResponse> {
    tracing::debug!("ai chat request from user {}", user.user_id);
    Ok(Json(state.ai_chat.chat(request).await?))
}
