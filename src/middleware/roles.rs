use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::types::Role;

/// Allow-list applied to a route group. An empty list admits any authenticated caller.
#[derive(Clone, Copy, Debug)]
pub struct RoleGate {
    pub roles: &'static [Role],
    pub message: &'static str,
}

impl RoleGate {
    pub const fn new(roles: &'static [Role], message: &'static str) -> Self {
        Self { roles, message }
    }

    pub fn admits(&self, role: Role) -> bool {
        self.roles.is_empty() || self.roles.contains(&role)
    }
}

pub const FACULTY_ONLY: RoleGate = RoleGate::new(
    &[Role::Faculty, Role::Admin],
    "faculty access required",
);
pub const STUDENT_DASHBOARD: RoleGate = RoleGate::new(
    &[Role::Student, Role::Admin],
    "student dashboard accessible only to students",
);
pub const ADMIN_ONLY: RoleGate = RoleGate::new(&[Role::Admin], "admin access required");

/// Runs after `jwt_auth_middleware`; a request that reaches it without an
/// identity is treated as unauthenticated.
pub async fn enforce_roles(State(gate): State<RoleGate>, request: Request, next: Next) -> Response {
    let Some(user) = request.extensions().get::<AuthUser>().copied() else {
        return ApiError::unauthorized("unauthorized").into_response();
    };
    if !gate.admits(user.role) {
        tracing::debug!("user {} ({}) denied: {}", user.user_id, user.role, gate.message);
        return ApiError::forbidden(gate.message).into_response();
    }
    next.run(request).await
}
