use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::TokenIdentity;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Role;

/// Authenticated caller, bound to the current request only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

impl From<TokenIdentity> for AuthUser {
    fn from(identity: TokenIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role,
        }
    }
}

/// Handlers take `AuthUser` as an argument; without the middleware in front
/// the extraction fails with 401.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("unauthorized"))
    }
}

/// Bearer token authentication. OPTIONS passes through untouched so CORS
/// preflight never needs a token.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let token = match extract_bearer(&headers) {
        Some(token) => token,
        None => return ApiError::unauthorized("missing bearer token").into_response(),
    };

    let identity = match state.tokens.validate(token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!("rejected token: {}", e);
            return ApiError::unauthorized("invalid token").into_response();
        }
    };

    request.extensions_mut().insert(AuthUser::from(identity));
    next.run(request).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));
    }
}
