use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry. Read-only at runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Quest {
    pub quest_id: i64,
    pub title: String,
    pub question: String,
    pub answer: String,
    pub icon: String,
    pub difficulty: String,
    pub coins: i64,
}

/// Quest as shown to a particular user. `answer` is deliberately absent.
#[derive(Debug, Clone, Serialize)]
pub struct QuestView {
    pub id: i64,
    pub title: String,
    pub question: String,
    pub icon: String,
    pub difficulty: String,
    pub coins: i64,
    pub completed: bool,
}

impl QuestView {
    pub fn new(quest: &Quest, completed: bool) -> Self {
        Self {
            id: quest.quest_id,
            title: quest.title.clone(),
            question: quest.question.clone(),
            icon: quest.icon.clone(),
            difficulty: quest.difficulty.clone(),
            coins: quest.coins,
            completed,
        }
    }
}

/// At most one per (user, quest); never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestCompletion {
    pub user_id: i64,
    pub quest_id: i64,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub completed_at: DateTime<Utc>,
}

impl QuestCompletion {
    pub fn new(user_id: i64, quest_id: i64, completed_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            quest_id,
            completed: true,
            completed_at,
        }
    }
}
