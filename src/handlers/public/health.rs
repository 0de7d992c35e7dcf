use axum::Json;
use serde_json::{json, Value};

/// GET /api/health - liveness probe
pub async fn health_get() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
