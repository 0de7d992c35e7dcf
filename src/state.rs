use std::sync::Arc;

use anyhow::Context;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{
    AccountService, AdminService, AiChatService, FacultyService, LeaderboardService,
    ResearchService, StudentService,
};

/// Shared per-process handles. Cloned into every request; all fields are cheap clones.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub students: StudentService,
    pub research: ResearchService,
    pub faculty: FacultyService,
    pub admin: AdminService,
    pub ai_chat: AiChatService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            config.security.jwt_secret.clone(),
            config.security.token_ttl_hours,
        );
        let leaderboard = LeaderboardService::new(store.clone());
        let research = ResearchService::new(store.clone());
        let ai_chat =
            AiChatService::new(config.ai.clone()).context("failed to build AI chat client")?;

        Ok(Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            students: StudentService::new(store.clone(), leaderboard.clone(), research.clone()),
            faculty: FacultyService::new(store.clone(), leaderboard.clone()),
            admin: AdminService::new(store, leaderboard),
            research,
            ai_chat,
            tokens,
            config: Arc::new(config),
        })
    }
}
