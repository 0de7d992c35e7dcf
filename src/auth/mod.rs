use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::User;
use crate::types::Role;

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub role: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            role: role.as_str().to_string(),
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing password hash")]
    MissingHash,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token secret not configured")]
    MissingSecret,

    #[error("token generation error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

/// A freshly signed session token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity recovered from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: i64,
    pub role: Role,
}

/// Issues and validates HS256 session tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, ttl_hours: u64) -> Self {
        let ttl_hours = if ttl_hours == 0 {
            DEFAULT_TOKEN_TTL_HOURS
        } else {
            i64::try_from(ttl_hours).unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
        };
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let claims = Claims::new(user.user_id, user.role, self.ttl);
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .unwrap_or_else(|| Utc::now() + self.ttl);

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        let token = encode(&Header::default(), &claims, &encoding_key)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, then recover the bound identity.
    pub fn validate(&self, token: &str) -> Result<TokenIdentity, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let role = token_data
            .claims
            .role
            .parse::<Role>()
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenIdentity {
            user_id: token_data.claims.user_id,
            role,
        })
    }
}

/// One-way salted hash for storage.
pub fn hash_password(raw: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(raw, cost)?)
}

pub fn verify_password(hash: &str, raw: &str) -> Result<(), AuthError> {
    if hash.is_empty() {
        return Err(AuthError::MissingHash);
    }
    match bcrypt::verify(raw, hash) {
        Ok(true) => Ok(()),
        Ok(false) | Err(_) => Err(AuthError::InvalidCredentials),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            user_id: 42,
            name: "Test User".into(),
            email: "test@learnonline.edu".into(),
            role,
            ..User::default()
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("student123", 4).unwrap();
        assert_ne!(hash, "student123");
        assert!(verify_password(&hash, "student123").is_ok());
        assert!(matches!(
            verify_password(&hash, "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn empty_hash_is_rejected() {
        assert!(matches!(
            verify_password("", "anything"),
            Err(AuthError::MissingHash)
        ));
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let tokens = TokenService::new("secret", 24);
        let issued = tokens.issue(&user(Role::Faculty)).unwrap();
        assert!(!issued.token.is_empty());
        assert!(issued.expires_at > Utc::now());

        let identity = tokens.validate(&issued.token).unwrap();
        assert_eq!(identity, TokenIdentity { user_id: 42, role: Role::Faculty });
    }

    #[test]
    fn issue_without_secret_fails() {
        let tokens = TokenService::new("", 24);
        assert!(matches!(
            tokens.issue(&user(Role::Student)),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issued = TokenService::new("one", 24).issue(&user(Role::Admin)).unwrap();
        let result = TokenService::new("two", 24).validate(&issued.token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            user_id: 1,
            role: "student".into(),
            sub: "1".into(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(26)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let result = TokenService::new("secret", 24).validate(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let result = TokenService::new("secret", 24).validate("not.a.jwt");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
