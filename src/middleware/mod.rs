pub mod auth;
pub mod json;
pub mod roles;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use json::JsonBody;
pub use roles::{enforce_roles, RoleGate, ADMIN_ONLY, FACULTY_ONLY, STUDENT_DASHBOARD};
