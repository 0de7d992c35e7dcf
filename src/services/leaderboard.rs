use std::sync::Arc;

use serde::Serialize;

use crate::database::{Store, StoreResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: i64,
    pub name: String,
    pub completed_quests: u64,
    pub streak: i64,
    pub coins: i64,
}

/// Coin-ranked leaderboard shared by the student, faculty and admin views.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn Store>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Top `limit` users by coins, descending. `None` returns every user.
    pub async fn top(&self, limit: Option<usize>) -> StoreResult<Vec<LeaderboardEntry>> {
        let users = self.store.users_by_coins(limit).await?;
        let mut entries = Vec::with_capacity(users.len());
        for user in users {
            let completed_quests = self.store.count_completed(user.user_id).await?;
            entries.push(LeaderboardEntry {
                id: user.user_id,
                name: user.name,
                completed_quests,
                streak: user.streak,
                coins: user.coins,
            });
        }
        Ok(entries)
    }
}
