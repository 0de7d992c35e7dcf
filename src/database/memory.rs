use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::{
    CourseUpdate, FacultyDashboard, Mentee, MenteeUpdate, OwnedCourse, Poll, Quest,
    QuestCompletion, ResearchPost, SuggestionReview, User, Vote,
};
use super::{Store, StoreResult};
use crate::types::Role;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    quests: Vec<Quest>,
    completions: Vec<QuestCompletion>,
    polls: Vec<Poll>,
    votes: Vec<Vote>,
    research_posts: Vec<ResearchPost>,
    dashboards: Vec<FacultyDashboard>,
}

/// Process-local store with the same per-call semantics as [`super::MongoStore`].
/// Each method holds the lock for exactly one operation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().filter(|u| u.role == role).cloned().collect())
    }

    async fn users_by_coins(&self, limit: Option<usize>) -> StoreResult<Vec<User>> {
        let mut users = self.inner.read().await.users.clone();
        users.sort_by(|a, b| b.coins.cmp(&a.coins));
        if let Some(limit) = limit {
            users.truncate(limit);
        }
        Ok(users)
    }

    async fn count_users(&self, role: Option<Role>) -> StoreResult<u64> {
        let data = self.inner.read().await;
        let count = match role {
            Some(role) => data.users.iter().filter(|u| u.role == role).count(),
            None => data.users.len(),
        };
        Ok(count as u64)
    }

    async fn increment_coins(&self, user_id: i64, amount: i64) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        if let Some(user) = data.users.iter_mut().find(|u| u.user_id == user_id) {
            user.coins += amount;
        }
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        match data.users.iter_mut().find(|u| u.user_id == user.user_id) {
            Some(existing) => *existing = user.clone(),
            None => data.users.push(user.clone()),
        }
        Ok(())
    }

    async fn list_quests(&self) -> StoreResult<Vec<Quest>> {
        Ok(self.inner.read().await.quests.clone())
    }

    async fn find_quest(&self, quest_id: i64) -> StoreResult<Option<Quest>> {
        let data = self.inner.read().await;
        Ok(data.quests.iter().find(|q| q.quest_id == quest_id).cloned())
    }

    async fn count_quests(&self) -> StoreResult<u64> {
        Ok(self.inner.read().await.quests.len() as u64)
    }

    async fn upsert_quest(&self, quest: &Quest) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        match data.quests.iter_mut().find(|q| q.quest_id == quest.quest_id) {
            Some(existing) => *existing = quest.clone(),
            None => data.quests.push(quest.clone()),
        }
        Ok(())
    }

    async fn find_completion(&self, user_id: i64, quest_id: i64) -> StoreResult<Option<QuestCompletion>> {
        let data = self.inner.read().await;
        Ok(data
            .completions
            .iter()
            .find(|c| c.user_id == user_id && c.quest_id == quest_id)
            .cloned())
    }

    async fn insert_completion(&self, completion: &QuestCompletion) -> StoreResult<()> {
        self.inner.write().await.completions.push(completion.clone());
        Ok(())
    }

    async fn upsert_completion(&self, completion: &QuestCompletion) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        match data
            .completions
            .iter_mut()
            .find(|c| c.user_id == completion.user_id && c.quest_id == completion.quest_id)
        {
            Some(existing) => *existing = completion.clone(),
            None => data.completions.push(completion.clone()),
        }
        Ok(())
    }

    async fn count_completed(&self, user_id: i64) -> StoreResult<u64> {
        let data = self.inner.read().await;
        Ok(data
            .completions
            .iter()
            .filter(|c| c.user_id == user_id && c.completed)
            .count() as u64)
    }

    async fn recent_completions(&self, limit: usize) -> StoreResult<Vec<QuestCompletion>> {
        let mut completions = self.inner.read().await.completions.clone();
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        completions.truncate(limit);
        Ok(completions)
    }

    async fn list_polls(&self) -> StoreResult<Vec<Poll>> {
        Ok(self.inner.read().await.polls.clone())
    }

    async fn find_poll(&self, poll_id: i64) -> StoreResult<Option<Poll>> {
        let data = self.inner.read().await;
        Ok(data.polls.iter().find(|p| p.poll_id == poll_id).cloned())
    }

    async fn upsert_poll(&self, poll: &Poll) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        match data.polls.iter_mut().find(|p| p.poll_id == poll.poll_id) {
            Some(existing) => *existing = poll.clone(),
            None => data.polls.push(poll.clone()),
        }
        Ok(())
    }

    async fn find_vote(&self, user_id: i64, poll_id: i64) -> StoreResult<Option<Vote>> {
        let data = self.inner.read().await;
        Ok(data
            .votes
            .iter()
            .find(|v| v.user_id == user_id && v.poll_id == poll_id)
            .cloned())
    }

    async fn insert_vote(&self, vote: &Vote) -> StoreResult<()> {
        self.inner.write().await.votes.push(vote.clone());
        Ok(())
    }

    async fn increment_poll_option(&self, poll_id: i64, option_index: usize) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        if let Some(option) = data
            .polls
            .iter_mut()
            .find(|p| p.poll_id == poll_id)
            .and_then(|p| p.options.get_mut(option_index))
        {
            option.votes += 1;
        }
        Ok(())
    }

    async fn list_research_posts(&self, limit: Option<usize>) -> StoreResult<Vec<ResearchPost>> {
        let mut posts = self.inner.read().await.research_posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn insert_research_post(&self, mut post: ResearchPost) -> StoreResult<ResearchPost> {
        post.id = Some(ObjectId::new());
        self.inner.write().await.research_posts.push(post.clone());
        Ok(post)
    }

    async fn ensure_research_post(&self, mut post: ResearchPost) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        if !data.research_posts.iter().any(|p| p.title == post.title) {
            post.id.get_or_insert_with(ObjectId::new);
            data.research_posts.push(post);
        }
        Ok(())
    }

    async fn find_dashboard(&self, faculty_id: i64) -> StoreResult<Option<FacultyDashboard>> {
        let data = self.inner.read().await;
        Ok(data.dashboards.iter().find(|d| d.faculty_id == faculty_id).cloned())
    }

    async fn count_dashboards(&self, faculty_id: i64) -> StoreResult<u64> {
        let data = self.inner.read().await;
        Ok(data.dashboards.iter().filter(|d| d.faculty_id == faculty_id).count() as u64)
    }

    async fn insert_dashboard(&self, dashboard: &FacultyDashboard) -> StoreResult<()> {
        let mut doc = dashboard.clone();
        doc.id.get_or_insert_with(ObjectId::new);
        self.inner.write().await.dashboards.push(doc);
        Ok(())
    }

    async fn set_pending_reviews(&self, faculty_id: i64, pending: i64) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        if let Some(doc) = data.dashboards.iter_mut().find(|d| d.faculty_id == faculty_id) {
            doc.overview.pending_reviews = pending;
        }
        Ok(())
    }

    async fn review_suggestion(
        &self,
        faculty_id: i64,
        suggestion_id: ObjectId,
        review: &SuggestionReview,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let mut data = self.inner.write().await;
        let Some(doc) = data.dashboards.iter_mut().find(|d| d.faculty_id == faculty_id) else {
            return Ok(None);
        };
        let Some(suggestion) = doc.ai_suggestions.iter_mut().find(|s| s.id == suggestion_id) else {
            return Ok(None);
        };
        suggestion.apply(review, now);
        doc.updated_at = now;
        Ok(Some(doc.clone()))
    }

    async fn update_mentee(
        &self,
        faculty_id: i64,
        mentee_id: ObjectId,
        update: &MenteeUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let mut data = self.inner.write().await;
        let Some(doc) = data.dashboards.iter_mut().find(|d| d.faculty_id == faculty_id) else {
            return Ok(None);
        };
        let Some(mentee) = doc.mentorship.mentees.iter_mut().find(|m| m.id == mentee_id) else {
            return Ok(None);
        };
        mentee.apply(update, now);
        doc.mentorship.last_updated = now;
        doc.updated_at = now;
        Ok(Some(doc.clone()))
    }

    async fn update_owned_course(
        &self,
        faculty_id: i64,
        course_id: ObjectId,
        update: &CourseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let mut data = self.inner.write().await;
        let Some(doc) = data.dashboards.iter_mut().find(|d| d.faculty_id == faculty_id) else {
            return Ok(None);
        };
        let Some(course) = doc.courses.iter_mut().find(|c| c.id == course_id) else {
            return Ok(None);
        };
        course.apply(update, now);
        doc.updated_at = now;
        Ok(Some(doc.clone()))
    }

    async fn push_mentee(
        &self,
        faculty_id: i64,
        mentee: &Mentee,
        now: DateTime<Utc>,
    ) -> StoreResult<FacultyDashboard> {
        let mut data = self.inner.write().await;
        let doc = dashboard_entry(&mut data.dashboards, faculty_id, now);
        doc.mentorship.mentees.push(mentee.clone());
        doc.mentorship.last_updated = now;
        doc.overview.students_mentored += 1;
        doc.updated_at = now;
        Ok(doc.clone())
    }

    async fn push_owned_course(
        &self,
        faculty_id: i64,
        course: &OwnedCourse,
        now: DateTime<Utc>,
    ) -> StoreResult<FacultyDashboard> {
        let mut data = self.inner.write().await;
        let doc = dashboard_entry(&mut data.dashboards, faculty_id, now);
        doc.courses.push(course.clone());
        doc.overview.courses_taught += 1;
        doc.updated_at = now;
        Ok(doc.clone())
    }
}

/// Existing dashboard for `faculty_id`, or a freshly inserted empty one.
fn dashboard_entry(
    dashboards: &mut Vec<FacultyDashboard>,
    faculty_id: i64,
    now: DateTime<Utc>,
) -> &mut FacultyDashboard {
    let index = match dashboards.iter().position(|d| d.faculty_id == faculty_id) {
        Some(index) => index,
        None => {
            let mut doc = FacultyDashboard::empty(faculty_id, now);
            doc.id = Some(ObjectId::new());
            dashboards.push(doc);
            dashboards.len() - 1
        }
    };
    &mut dashboards[index]
}
