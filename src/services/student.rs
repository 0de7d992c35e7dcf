use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::leaderboard::{LeaderboardEntry, LeaderboardService};
use super::research::ResearchService;
use super::{ServiceError, ServiceResult};
use crate::database::models::{
    CourseProgressView, PollView, PublicUser, QuestCompletion, QuestView, ResearchPostView, Vote,
};
use crate::database::Store;
use crate::types::Role;

const DASHBOARD_LEADERS: usize = 5;
const DASHBOARD_FEED: usize = 25;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompleteQuestRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub option_index: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub course_progress: i64,
    pub academic_standing: i64,
    pub gamification_level: i64,
    pub current_streak: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyQuest {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub xp: i64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub user: PublicUser,
    pub metrics: DashboardMetrics,
    pub daily_quests: Vec<DailyQuest>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub active_courses: Vec<CourseProgressView>,
    pub research_feed: Vec<ResearchPostView>,
}

/// Quest, poll and profile operations for the student-facing surface.
#[derive(Clone)]
pub struct StudentService {
    store: Arc<dyn Store>,
    leaderboard: LeaderboardService,
    research: ResearchService,
}

impl StudentService {
    pub fn new(
        store: Arc<dyn Store>,
        leaderboard: LeaderboardService,
        research: ResearchService,
    ) -> Self {
        Self {
            store,
            leaderboard,
            research,
        }
    }

    /// Students may only read their own profile; faculty and admins may read anyone's.
    pub async fn user(&self, actor_id: i64, role: Role, user_id: i64) -> ServiceResult<PublicUser> {
        if role == Role::Student && actor_id != user_id {
            return Err(ServiceError::forbidden(
                "students may only view their own profile",
            ));
        }
        self.store
            .find_user(user_id)
            .await
            .map_err(ServiceError::store("failed to load user"))?
            .map(|user| PublicUser::from(&user))
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }

    /// Catalog with the `completed` flag for `target`, or for the actor when
    /// the actor is a student or no target is given.
    pub async fn quests(
        &self,
        actor_id: i64,
        role: Role,
        target: Option<i64>,
    ) -> ServiceResult<Vec<QuestView>> {
        let user_id = match target {
            Some(id) if id > 0 && role != Role::Student => id,
            _ => actor_id,
        };
        self.quests_for(user_id).await
    }

    async fn quests_for(&self, user_id: i64) -> ServiceResult<Vec<QuestView>> {
        let quests = self
            .store
            .list_quests()
            .await
            .map_err(ServiceError::store("failed to fetch quests"))?;

        let mut views = Vec::with_capacity(quests.len());
        for quest in &quests {
            let completed = self
                .store
                .find_completion(user_id, quest.quest_id)
                .await
                .map_err(ServiceError::store("failed to fetch quests"))?
                .is_some_and(|c| c.completed);
            views.push(QuestView::new(quest, completed));
        }
        Ok(views)
    }

    /// Records a completion and credits the reward once. Repeat calls succeed
    /// without crediting again. Returns the quest's reward.
    pub async fn complete_quest(
        &self,
        actor_id: i64,
        role: Role,
        quest_id: i64,
        request: CompleteQuestRequest,
    ) -> ServiceResult<i64> {
        let target = match request.user_id {
            Some(id) if id > 0 && role != Role::Student => id,
            _ => actor_id,
        };
        if role == Role::Faculty && target != actor_id {
            return Err(ServiceError::forbidden(
                "faculty cannot complete quests for students",
            ));
        }

        let quest = self
            .store
            .find_quest(quest_id)
            .await
            .map_err(ServiceError::store("failed to load quest"))?
            .ok_or_else(|| ServiceError::not_found("quest not found"))?;

        let existing = self
            .store
            .find_completion(target, quest_id)
            .await
            .map_err(ServiceError::store("failed to update"))?;
        if existing.is_some() {
            debug!("quest {} already completed by user {}", quest_id, target);
            return Ok(quest.coins);
        }

        self.store
            .insert_completion(&QuestCompletion::new(target, quest_id, Utc::now()))
            .await
            .map_err(ServiceError::store("failed to update"))?;
        self.store
            .increment_coins(target, quest.coins)
            .await
            .map_err(ServiceError::store("failed to update"))?;

        info!("user {} completed quest {} (+{} coins)", target, quest_id, quest.coins);
        Ok(quest.coins)
    }

    pub async fn polls(&self) -> ServiceResult<Vec<PollView>> {
        let polls = self
            .store
            .list_polls()
            .await
            .map_err(ServiceError::store("failed to fetch polls"))?;
        Ok(polls.into_iter().map(PollView::from).collect())
    }

    /// One vote per user per poll; a second vote is accepted and ignored.
    pub async fn vote(&self, actor_id: i64, poll_id: i64, request: VoteRequest) -> ServiceResult<()> {
        let poll = self
            .store
            .find_poll(poll_id)
            .await
            .map_err(ServiceError::store("failed to load poll"))?
            .ok_or_else(|| ServiceError::not_found("poll not found"))?;

        let option_index = usize::try_from(request.option_index)
            .ok()
            .filter(|index| *index < poll.options.len())
            .ok_or_else(|| ServiceError::validation("invalid option"))?;

        let existing = self
            .store
            .find_vote(actor_id, poll_id)
            .await
            .map_err(ServiceError::store("failed to record vote"))?;
        if existing.is_some() {
            debug!("user {} already voted on poll {}", actor_id, poll_id);
            return Ok(());
        }

        self.store
            .insert_vote(&Vote {
                user_id: actor_id,
                poll_id,
                option_index: request.option_index,
                voted_at: Utc::now(),
            })
            .await
            .map_err(ServiceError::store("failed to record vote"))?;
        self.store
            .increment_poll_option(poll_id, option_index)
            .await
            .map_err(ServiceError::store("failed to record vote"))?;
        Ok(())
    }

    /// Coin-ranked users; a missing or zero limit returns everyone.
    pub async fn leaderboard(&self, limit: Option<usize>) -> ServiceResult<Vec<LeaderboardEntry>> {
        self.leaderboard
            .top(limit.filter(|l| *l > 0))
            .await
            .map_err(ServiceError::store("failed to load leaderboard"))
    }

    /// Admins may inspect another student's dashboard through `user_override`.
    pub async fn dashboard(
        &self,
        actor_id: i64,
        role: Role,
        user_override: Option<i64>,
    ) -> ServiceResult<StudentDashboard> {
        let target = match (role, user_override) {
            (Role::Admin, Some(id)) if id > 0 => id,
            _ => actor_id,
        };

        let user = self
            .store
            .find_user(target)
            .await
            .map_err(ServiceError::store("failed to load student"))?
            .ok_or_else(|| ServiceError::not_found("student not found"))?;

        let daily_quests = self
            .quests_for(target)
            .await?
            .into_iter()
            .map(|q| DailyQuest {
                id: q.id,
                title: q.title,
                description: q.question,
                xp: q.coins,
                completed: q.completed,
            })
            .collect();

        let leaderboard = self
            .leaderboard
            .top(Some(DASHBOARD_LEADERS))
            .await
            .map_err(ServiceError::store("failed to load leaderboard"))?;

        let research_feed = self.research.feed(target, Some(DASHBOARD_FEED)).await?;

        Ok(StudentDashboard {
            metrics: DashboardMetrics {
                course_progress: user.course_progress,
                academic_standing: user.academic_standing,
                gamification_level: user.gamification_level,
                current_streak: user.streak,
            },
            active_courses: user.active_courses.iter().map(CourseProgressView::from).collect(),
            user: PublicUser::from(&user),
            daily_quests,
            leaderboard,
            research_feed,
        })
    }
}
