pub mod account;
pub mod admin;
pub mod ai_chat;
pub mod faculty;
pub mod format;
pub mod leaderboard;
pub mod research;
pub mod student;

use thiserror::Error;

use crate::auth::AuthError;
use crate::database::StoreError;

pub use account::AccountService;
pub use admin::AdminService;
pub use ai_chat::AiChatService;
pub use faculty::FacultyService;
pub use leaderboard::{LeaderboardEntry, LeaderboardService};
pub use research::ResearchService;
pub use student::StudentService;

/// Domain failures surfaced by the services, mapped onto HTTP statuses in `error.rs`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Provider message is passed through to the client.
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// `context` is the client-facing message; `source` is only logged.
    #[error("{context}: {source}")]
    Store { context: String, source: StoreError },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    /// Adapter for `map_err`: wraps a store failure with a client-safe context.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> ServiceError {
        move |source| ServiceError::Store {
            context: context.to_string(),
            source,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
