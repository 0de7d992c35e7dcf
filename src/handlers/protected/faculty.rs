// handlers/protected/faculty.rs - /api/faculty/* (faculty and admin only)
//
// Every route acts on the caller's own dashboard unless an admin passes
// `?faculty_id=`. Every mutation answers with the re-rendered dashboard.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::handlers::{parse_id, ApiResult};
use crate::middleware::{AuthUser, JsonBody};
use crate::services::faculty::{
    resolve_target, CourseStatusRequest, FacultyOverview, MenteeStatusRequest, NewCourseRequest,
    NewMenteeRequest, ReviewRequest,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FacultyQuery {
    pub faculty_id: Option<String>,
}

impl FacultyQuery {
    fn target(&self, caller: AuthUser) -> i64 {
        resolve_target(caller.user_id, caller.role, parse_id(self.faculty_id.as_deref()))
    }
}

/// GET /api/faculty/dashboard (also served at /api/faculty/overview)
pub async fn dashboard_get(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<FacultyQuery>,
) -> ApiResult<FacultyOverview> {
    Ok(Json(state.faculty.overview(query.target(caller)).await?))
}

/// POST /api/faculty/dashboard/ai/:id/review
pub async fn suggestion_review_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<FacultyQuery>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> ApiResult<FacultyOverview> {
    let overview = state
        .faculty
        .review_suggestion(query.target(caller), &id, request)
        .await?;
    Ok(Json(overview))
}

/// POST /api/faculty/dashboard/mentorship
pub async fn mentee_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<FacultyQuery>,
    JsonBody(request): JsonBody<NewMenteeRequest>,
) -> ApiResult<FacultyOverview> {
    Ok(Json(state.faculty.add_mentee(query.target(caller), request).await?))
}

/// POST /api/faculty/dashboard/mentorship/:id/status
pub async fn mentee_status_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<FacultyQuery>,
    JsonBody(request): JsonBody<MenteeStatusRequest>,
) -> ApiResult<FacultyOverview> {
    let overview = state
        .faculty
        .update_mentee(query.target(caller), &id, request)
        .await?;
    Ok(Json(overview))
}

/// POST /api/faculty/dashboard/courses
pub async fn course_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<FacultyQuery>,
    JsonBody(request): JsonBody<NewCourseRequest>,
) -> ApiResult<FacultyOverview> {
    Ok(Json(state.faculty.add_course(query.target(caller), request).await?))
}

/// POST /api/faculty/dashboard/courses/:id/status
pub async fn course_status_post(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<FacultyQuery>,
    JsonBody(request): JsonBody<CourseStatusRequest>,
) -> ApiResult<FacultyOverview> {
    let overview = state
        .faculty
        .update_course(query.target(caller), &id, request)
        .await?;
    Ok(Json(overview))
}
