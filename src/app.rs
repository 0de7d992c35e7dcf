use axum::{
    http::{HeaderValue, Method},
    middleware::{from_fn_with_state, map_response},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::{
    enforce_roles, jwt_auth_middleware, RoleGate, ADMIN_ONLY, FACULTY_ONLY, STUDENT_DASHBOARD,
};
use crate::state::AppState;

/// Full router: public routes, token-protected routes with per-group role
/// gates, then CORS and request tracing around everything.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        .nest(
            "/api",
            public_routes().merge(protected_routes(state.clone())),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(map_response(json_fallback_errors)),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health_get))
        .route("/auth/login", post(public::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{admin, ai, me, research, student};

    Router::new()
        .route("/me", get(me::me_get))
        .route("/user/:id", get(student::user_get))
        .route("/quests", get(student::quests_get))
        .route("/quests/:id/complete", post(student::quest_complete_post))
        .route("/polls", get(student::polls_get))
        .route("/polls/:id/vote", post(student::poll_vote_post))
        .route("/leaderboard", get(student::leaderboard_get))
        .route(
            "/research/posts",
            get(research::posts_get).post(research::posts_post),
        )
        .route("/ai/chat", post(ai::chat_post))
        .merge(gated(
            Router::new().route("/student/dashboard", get(student::dashboard_get)),
            STUDENT_DASHBOARD,
        ))
        .merge(gated(faculty_routes(), FACULTY_ONLY))
        .merge(gated(
            Router::new().route("/admin/overview", get(admin::overview_get)),
            ADMIN_ONLY,
        ))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn faculty_routes() -> Router<AppState> {
    use protected::faculty;

    Router::new()
        .route("/faculty/dashboard", get(faculty::dashboard_get))
        .route("/faculty/overview", get(faculty::dashboard_get))
        .route(
            "/faculty/dashboard/ai/:id/review",
            post(faculty::suggestion_review_post),
        )
        .route("/faculty/dashboard/mentorship", post(faculty::mentee_post))
        .route(
            "/faculty/dashboard/mentorship/:id/status",
            post(faculty::mentee_status_post),
        )
        .route("/faculty/dashboard/courses", post(faculty::course_post))
        .route(
            "/faculty/dashboard/courses/:id/status",
            post(faculty::course_status_post),
        )
}

/// Role gates run inside the auth layer, so `AuthUser` is always present here.
fn gated(routes: Router<AppState>, gate: RoleGate) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(gate, enforce_roles))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();
    base.allow_origin(allowed)
}

/// Unmatched routes and methods still answer with the JSON error envelope.
/// Only bodiless framework replies are rewritten; the `Allow` header is kept.
async fn json_fallback_errors(response: Response) -> Response {
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;

    if response.headers().contains_key(header::CONTENT_TYPE) {
        return response;
    }
    match response.status() {
        StatusCode::NOT_FOUND => ApiError::not_found("not found").into_response(),
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = response.headers().get(header::ALLOW).cloned();
            let mut rewritten = ApiError::method_not_allowed().into_response();
            if let Some(allow) = allow {
                rewritten.headers_mut().insert(header::ALLOW, allow);
            }
            rewritten
        }
        _ => response,
    }
}
