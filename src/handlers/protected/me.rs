use axum::{extract::State, Json};

use crate::database::models::PublicUser;
use crate::handlers::ApiResult;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/me - public profile of the caller
pub async fn me_get(State(state): State<AppState>, user: AuthUser) -> ApiResult<PublicUser> {
    Ok(Json(state.accounts.profile(user.user_id).await?))
}
