// handlers/public/auth.rs - POST /api/auth/login

use axum::{extract::State, Json};

use crate::handlers::ApiResult;
use crate::middleware::JsonBody;
use crate::services::account::{LoginRequest, LoginResponse};
use crate::state::AppState;

/// POST /api/auth/login - exchange email + password for a bearer token
///
/// ```json
/// { "email": "alex@learnonline.edu", "password": "..." }
/// ```
///
/// Unknown email and wrong password both answer 401 `invalid credentials`.
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = state.accounts.login(request).await?;
    tracing::info!("user {} logged in", response.user.id);
    Ok(Json(response))
}
