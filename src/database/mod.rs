pub mod memory;
pub mod models;
pub mod mongo;
pub mod seed;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::Role;
use models::{
    CourseUpdate, FacultyDashboard, Mentee, MenteeUpdate, OwnedCourse, Poll, Quest,
    QuestCompletion, ResearchPost, SuggestionReview, User, Vote,
};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Errors from the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("bson encode error: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("bson decode error: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("{0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Domain-level access to the collections. Every method is a single store
/// operation; callers compose them without transactions.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>>;
    /// Users ordered by coins descending; `None` returns everyone.
    async fn users_by_coins(&self, limit: Option<usize>) -> StoreResult<Vec<User>>;
    async fn count_users(&self, role: Option<Role>) -> StoreResult<u64>;
    async fn increment_coins(&self, user_id: i64, amount: i64) -> StoreResult<()>;
    async fn upsert_user(&self, user: &User) -> StoreResult<()>;

    // quests
    async fn list_quests(&self) -> StoreResult<Vec<Quest>>;
    async fn find_quest(&self, quest_id: i64) -> StoreResult<Option<Quest>>;
    async fn count_quests(&self) -> StoreResult<u64>;
    async fn upsert_quest(&self, quest: &Quest) -> StoreResult<()>;

    // completions
    async fn find_completion(&self, user_id: i64, quest_id: i64) -> StoreResult<Option<QuestCompletion>>;
    async fn insert_completion(&self, completion: &QuestCompletion) -> StoreResult<()>;
    async fn upsert_completion(&self, completion: &QuestCompletion) -> StoreResult<()>;
    async fn count_completed(&self, user_id: i64) -> StoreResult<u64>;
    /// Most recent completions first.
    async fn recent_completions(&self, limit: usize) -> StoreResult<Vec<QuestCompletion>>;

    // polls and votes
    async fn list_polls(&self) -> StoreResult<Vec<Poll>>;
    async fn find_poll(&self, poll_id: i64) -> StoreResult<Option<Poll>>;
    async fn upsert_poll(&self, poll: &Poll) -> StoreResult<()>;
    async fn find_vote(&self, user_id: i64, poll_id: i64) -> StoreResult<Option<Vote>>;
    async fn insert_vote(&self, vote: &Vote) -> StoreResult<()>;
    async fn increment_poll_option(&self, poll_id: i64, option_index: usize) -> StoreResult<()>;

    // research
    /// Newest first; `None` returns every post.
    async fn list_research_posts(&self, limit: Option<usize>) -> StoreResult<Vec<ResearchPost>>;
    async fn insert_research_post(&self, post: ResearchPost) -> StoreResult<ResearchPost>;
    /// Insert unless a post with the same title exists.
    async fn ensure_research_post(&self, post: ResearchPost) -> StoreResult<()>;

    // faculty dashboards
    async fn find_dashboard(&self, faculty_id: i64) -> StoreResult<Option<FacultyDashboard>>;
    async fn count_dashboards(&self, faculty_id: i64) -> StoreResult<u64>;
    async fn insert_dashboard(&self, dashboard: &FacultyDashboard) -> StoreResult<()>;
    async fn set_pending_reviews(&self, faculty_id: i64, pending: i64) -> StoreResult<()>;

    /// Positional updates. `None` means no (faculty, sub-document) pair matched.
    async fn review_suggestion(
        &self,
        faculty_id: i64,
        suggestion_id: ObjectId,
        review: &SuggestionReview,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>>;
    async fn update_mentee(
        &self,
        faculty_id: i64,
        mentee_id: ObjectId,
        update: &MenteeUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>>;
    async fn update_owned_course(
        &self,
        faculty_id: i64,
        course_id: ObjectId,
        update: &CourseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>>;

    /// Create-or-append in one conditional operation. Returns the post-update document.
    async fn push_mentee(
        &self,
        faculty_id: i64,
        mentee: &Mentee,
        now: DateTime<Utc>,
    ) -> StoreResult<FacultyDashboard>;
    async fn push_owned_course(
        &self,
        faculty_id: i64,
        course: &OwnedCourse,
        now: DateTime<Utc>,
    ) -> StoreResult<FacultyDashboard>;
}
