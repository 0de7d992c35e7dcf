use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::format::rfc3339;
use super::leaderboard::{LeaderboardEntry, LeaderboardService};
use super::{ServiceError, ServiceResult};
use crate::database::Store;
use crate::types::Role;

const RECENT_ACTIVITY: usize = 5;
const LEADERS: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub users: u64,
    pub students: u64,
    pub faculty: u64,
    pub active_quests: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub user_name: String,
    pub quest_title: String,
    pub completed_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub totals: Totals,
    pub average_coins: i64,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    leaderboard: LeaderboardService,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, leaderboard: LeaderboardService) -> Self {
        Self { store, leaderboard }
    }

    pub async fn overview(&self) -> ServiceResult<AdminOverview> {
        let users = self
            .store
            .list_users()
            .await
            .map_err(ServiceError::store("failed to load users"))?;
        let active_quests = self
            .store
            .count_quests()
            .await
            .map_err(ServiceError::store("failed to load quests"))?;

        let totals = Totals {
            users: self.count_users(None).await?,
            students: self.count_users(Some(Role::Student)).await?,
            faculty: self.count_users(Some(Role::Faculty)).await?,
            active_quests,
        };

        let average_coins = if users.is_empty() {
            0
        } else {
            users.iter().map(|u| u.coins).sum::<i64>() / users.len() as i64
        };

        let leaderboard = self
            .leaderboard
            .top(Some(LEADERS))
            .await
            .map_err(ServiceError::store("failed to load users"))?;

        let recent_activity = self.recent_activity(&users).await?;

        Ok(AdminOverview {
            totals,
            average_coins,
            leaderboard,
            recent_activity,
        })
    }

    async fn count_users(&self, role: Option<Role>) -> ServiceResult<u64> {
        self.store
            .count_users(role)
            .await
            .map_err(ServiceError::store("failed to count users"))
    }

    async fn recent_activity(
        &self,
        users: &[crate::database::models::User],
    ) -> ServiceResult<Vec<ActivityItem>> {
        let completions = self
            .store
            .recent_completions(RECENT_ACTIVITY)
            .await
            .map_err(ServiceError::store("failed to load activity"))?;

        let names: HashMap<i64, &str> = users.iter().map(|u| (u.user_id, u.name.as_str())).collect();
        let mut quest_titles: HashMap<i64, String> = HashMap::new();

        let mut items = Vec::with_capacity(completions.len());
        for completion in completions {
            if !quest_titles.contains_key(&completion.quest_id) {
                let title = self
                    .store
                    .find_quest(completion.quest_id)
                    .await
                    .map_err(ServiceError::store("failed to load activity"))?
                    .map(|q| q.title)
                    .unwrap_or_default();
                quest_titles.insert(completion.quest_id, title);
            }

            items.push(ActivityItem {
                user_name: names
                    .get(&completion.user_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                quest_title: quest_titles
                    .get(&completion.quest_id)
                    .cloned()
                    .unwrap_or_default(),
                completed_at: rfc3339(completion.completed_at),
            });
        }
        Ok(items)
    }
}
