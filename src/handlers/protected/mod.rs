// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Role gates are applied per route group in app.rs; handlers receive the
// caller through the `AuthUser` extractor.

pub mod admin;
pub mod ai;
pub mod faculty;
pub mod me;
pub mod research;
pub mod student;
