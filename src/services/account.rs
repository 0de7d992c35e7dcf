use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ServiceError, ServiceResult};
use crate::auth::{verify_password, AuthError, TokenService};
use crate::database::models::PublicUser;
use crate::database::Store;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: PublicUser,
}

/// Credential exchange and profile lookup.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let email = request.email.trim().to_lowercase();

        let user = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(ServiceError::store("failed to process login"))?
            .ok_or_else(|| {
                warn!("login attempt for unknown email {}", email);
                AuthError::InvalidCredentials
            })?;

        verify_password(&user.password_hash, &request.password).inspect_err(|_| {
            warn!("login rejected for user {}", user.user_id);
        })?;

        let issued = self.tokens.issue(&user)?;
        Ok(LoginResponse {
            token: issued.token,
            expires_at: super::format::rfc3339(issued.expires_at),
            user: PublicUser::from(&user),
        })
    }

    pub async fn profile(&self, user_id: i64) -> ServiceResult<PublicUser> {
        self.store
            .find_user(user_id)
            .await
            .map_err(ServiceError::store("failed to load user"))?
            .map(|user| PublicUser::from(&user))
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{seed, MemoryStore};

    async fn service() -> AccountService {
        let store = MemoryStore::new();
        seed::seed_sample_data(&store, 4).await.unwrap();
        AccountService::new(Arc::new(store), TokenService::new("secret", 24))
    }

    #[tokio::test]
    async fn login_normalises_email() {
        let accounts = service().await;
        let response = accounts
            .login(LoginRequest {
                email: "  Alex@LearnOnline.edu ".into(),
                password: "student123".into(),
            })
            .await
            .unwrap();
        assert!(!response.token.is_empty());
        assert_eq!(response.user.id, 1);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let accounts = service().await;
        let err = accounts
            .login(LoginRequest {
                email: "alex@learnonline.edu".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let accounts = service().await;
        let err = accounts
            .login(LoginRequest {
                email: "ghost@learnonline.edu".into(),
                password: "student123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::InvalidCredentials)));
    }
}
