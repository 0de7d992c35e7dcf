use axum::{extract::State, Json};

use crate::handlers::ApiResult;
use crate::services::admin::AdminOverview;
use crate::state::AppState;

/// GET /api/admin/overview - platform totals, top five and recent completions
pub async fn overview_get(State(state): State<AppState>) -> ApiResult<AdminOverview> {
    Ok(Json(state.admin.overview().await?))
}
