use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
    UpdateOptions,
};
use mongodb::{Client, Collection, Cursor, Database, IndexModel};
use tracing::{info, warn};

use super::models::{
    CourseUpdate, FacultyDashboard, Mentee, MenteeUpdate, OwnedCourse, Poll, Quest,
    QuestCompletion, ResearchPost, SuggestionReview, User, Vote,
};
use super::{Store, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::types::Role;

const USERS: &str = "users";
const QUESTS: &str = "quests";
const USER_QUESTS: &str = "user_quests";
const POLLS: &str = "polls";
const VOTES: &str = "votes";
const RESEARCH_POSTS: &str = "research_posts";
const FACULTY_DASHBOARDS: &str = "faculty_dashboards";

/// MongoDB-backed store. Collection handles are owned by this value and
/// passed around through `AppState`, never held in globals.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let uri = config
            .uri
            .as_deref()
            .ok_or_else(|| StoreError::Internal("MONGODB_URI is not configured".to_string()))?;

        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("learnonline-api".to_string());
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout_secs));

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        info!("connected to MongoDB database {}", config.name);

        let store = Self {
            db: client.database(&config.name),
        };
        store.ensure_indexes().await;
        Ok(store)
    }

    /// Index creation failures are logged, not fatal; existing data may violate them.
    async fn ensure_indexes(&self) {
        let unique = IndexOptions::builder().unique(true).build();

        let dashboards = IndexModel::builder()
            .keys(doc! { "faculty_id": 1 })
            .options(unique.clone())
            .build();
        if let Err(e) = self.dashboards().create_index(dashboards, None).await {
            warn!("failed to ensure faculty_dashboards index: {}", e);
        }

        let emails = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique)
            .build();
        if let Err(e) = self.users().create_index(emails, None).await {
            warn!("failed to ensure users.email index: {}", e);
        }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    /// Untyped view of `users` for scans that must survive malformed documents.
    fn user_documents(&self) -> Collection<Document> {
        self.db.collection(USERS)
    }

    fn quests(&self) -> Collection<Quest> {
        self.db.collection(QUESTS)
    }

    fn completions(&self) -> Collection<QuestCompletion> {
        self.db.collection(USER_QUESTS)
    }

    fn polls(&self) -> Collection<Poll> {
        self.db.collection(POLLS)
    }

    fn votes(&self) -> Collection<Vote> {
        self.db.collection(VOTES)
    }

    fn research_posts(&self) -> Collection<ResearchPost> {
        self.db.collection(RESEARCH_POSTS)
    }

    fn dashboards(&self) -> Collection<FacultyDashboard> {
        self.db.collection(FACULTY_DASHBOARDS)
    }

    async fn upsert<T: serde::Serialize + Send + Sync>(
        collection: &Collection<T>,
        filter: Document,
        value: &T,
    ) -> StoreResult<()> {
        let update = doc! { "$set": bson::to_document(value)? };
        let options = UpdateOptions::builder().upsert(true).build();
        collection.update_one(filter, update, options).await?;
        Ok(())
    }

    /// Positional `$set` on the sub-document matching `array_field._id`.
    async fn patch_embedded(
        &self,
        faculty_id: i64,
        array_field: &str,
        element_id: ObjectId,
        set_fields: Document,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let mut filter = doc! { "faculty_id": faculty_id };
        filter.insert(format!("{}._id", array_field), element_id);
        let update = doc! { "$set": set_fields };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .dashboards()
            .find_one_and_update(filter, update, options)
            .await?)
    }

    /// Upserting append. `$setOnInsert` shapes a fresh document; paths must not
    /// overlap with the `$push`/`$inc` paths of the same update.
    async fn append_embedded(
        &self,
        faculty_id: i64,
        update: Document,
    ) -> StoreResult<FacultyDashboard> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        self.dashboards()
            .find_one_and_update(doc! { "faculty_id": faculty_id }, update, options)
            .await?
            .ok_or_else(|| StoreError::Internal("dashboard upsert returned no document".to_string()))
    }
}

fn bson_time(t: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(t)
}

fn empty_analytics() -> Document {
    doc! { "labels": [], "students": [], "avg_grade": [] }
}

async fn collect_users(cursor: Cursor<Document>) -> StoreResult<Vec<User>> {
    let documents: Vec<Document> = cursor.try_collect().await?;
    Ok(decode_users(documents))
}

/// Documents that do not decode as `User` are logged and skipped so one bad
/// record cannot take down the leaderboard or dashboard scans.
fn decode_users(documents: Vec<Document>) -> Vec<User> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").cloned();
            match bson::from_document::<User>(document) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("skipping undecodable user document {:?}: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

fn suggestion_review_set(review: &SuggestionReview, now: DateTime<Utc>) -> Document {
    let mut set = doc! {
        "ai_suggestions.$.status": review.status.as_str(),
        "ai_suggestions.$.updated_at": bson_time(now),
        "updated_at": bson_time(now),
    };
    if let Some(recommendation) = &review.recommendation {
        set.insert("ai_suggestions.$.recommendation", recommendation.as_str());
    }
    if let Some(grade) = &review.grade_suggestion {
        set.insert("ai_suggestions.$.grade_suggestion", grade.as_str());
    }
    set
}

fn mentee_set(update: &MenteeUpdate, now: DateTime<Utc>) -> Document {
    let mut set = doc! {
        "mentorship.mentees.$.updated_at": bson_time(now),
        "mentorship.last_updated": bson_time(now),
        "updated_at": bson_time(now),
    };
    if let Some(status) = &update.status {
        set.insert("mentorship.mentees.$.status", status.as_str());
    }
    if let Some(next_session) = &update.next_session {
        set.insert("mentorship.mentees.$.next_session", next_session.as_str());
    }
    if let Some(note) = &update.note {
        set.insert("mentorship.mentees.$.note", note.as_str());
    }
    set
}

fn course_set(update: &CourseUpdate, now: DateTime<Utc>) -> Document {
    let mut set = doc! {
        "courses.$.last_updated": bson_time(now),
        "updated_at": bson_time(now),
    };
    if let Some(status) = &update.status {
        set.insert("courses.$.status", status.as_str());
    }
    if let Some(title) = &update.title {
        set.insert("courses.$.title", title.as_str());
    }
    if let Some(code) = &update.code {
        set.insert("courses.$.code", code.as_str());
    }
    set
}

/// Upserting append of a mentee. `$setOnInsert` paths stay disjoint from the
/// `$push`/`$set`/`$inc` paths or the server rejects the update.
fn mentee_push_update(mentee: &Mentee, now: DateTime<Utc>) -> StoreResult<Document> {
    Ok(doc! {
        "$push": { "mentorship.mentees": bson::to_bson(mentee)? },
        "$set": {
            "mentorship.last_updated": bson_time(now),
            "updated_at": bson_time(now),
        },
        "$inc": { "overview.students_mentored": 1_i64 },
        "$setOnInsert": {
            "overview.courses_taught": 0_i64,
            "overview.average_grade": 0.0,
            "overview.pending_reviews": 0_i64,
            "ai_suggestions": [],
            "courses": [],
            "analytics": empty_analytics(),
            "created_at": bson_time(now),
        },
    })
}

fn course_push_update(course: &OwnedCourse, now: DateTime<Utc>) -> StoreResult<Document> {
    Ok(doc! {
        "$push": { "courses": bson::to_bson(course)? },
        "$set": { "updated_at": bson_time(now) },
        "$inc": { "overview.courses_taught": 1_i64 },
        "$setOnInsert": {
            "overview.students_mentored": 0_i64,
            "overview.average_grade": 0.0,
            "overview.pending_reviews": 0_i64,
            "ai_suggestions": [],
            "mentorship": { "mentees": [], "last_updated": bson_time(now) },
            "analytics": empty_analytics(),
            "created_at": bson_time(now),
        },
    })
}

#[async_trait]
impl Store for MongoStore {
    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "user_id": user_id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let cursor = self.user_documents().find(doc! {}, None).await?;
        collect_users(cursor).await
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let cursor = self
            .user_documents()
            .find(doc! { "role": role.as_str() }, None)
            .await?;
        collect_users(cursor).await
    }

    async fn users_by_coins(&self, limit: Option<usize>) -> StoreResult<Vec<User>> {
        let options = FindOptions::builder()
            .sort(doc! { "coins": -1 })
            .limit(limit.map(|n| n as i64))
            .build();
        let cursor = self.user_documents().find(doc! {}, options).await?;
        collect_users(cursor).await
    }

    async fn count_users(&self, role: Option<Role>) -> StoreResult<u64> {
        let filter = match role {
            Some(role) => doc! { "role": role.as_str() },
            None => doc! {},
        };
        Ok(self.users().count_documents(filter, None).await?)
    }

    async fn increment_coins(&self, user_id: i64, amount: i64) -> StoreResult<()> {
        self.users()
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$inc": { "coins": amount } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn upsert_user(&self, user: &User) -> StoreResult<()> {
        Self::upsert(&self.users(), doc! { "user_id": user.user_id }, user).await
    }

    async fn list_quests(&self) -> StoreResult<Vec<Quest>> {
        let options = FindOptions::builder().sort(doc! { "quest_id": 1 }).build();
        let cursor = self.quests().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_quest(&self, quest_id: i64) -> StoreResult<Option<Quest>> {
        Ok(self.quests().find_one(doc! { "quest_id": quest_id }, None).await?)
    }

    async fn count_quests(&self) -> StoreResult<u64> {
        Ok(self.quests().count_documents(doc! {}, None).await?)
    }

    async fn upsert_quest(&self, quest: &Quest) -> StoreResult<()> {
        Self::upsert(&self.quests(), doc! { "quest_id": quest.quest_id }, quest).await
    }

    async fn find_completion(&self, user_id: i64, quest_id: i64) -> StoreResult<Option<QuestCompletion>> {
        Ok(self
            .completions()
            .find_one(doc! { "user_id": user_id, "quest_id": quest_id }, None)
            .await?)
    }

    async fn insert_completion(&self, completion: &QuestCompletion) -> StoreResult<()> {
        self.completions().insert_one(completion, None).await?;
        Ok(())
    }

    async fn upsert_completion(&self, completion: &QuestCompletion) -> StoreResult<()> {
        let filter = doc! { "user_id": completion.user_id, "quest_id": completion.quest_id };
        Self::upsert(&self.completions(), filter, completion).await
    }

    async fn count_completed(&self, user_id: i64) -> StoreResult<u64> {
        Ok(self
            .completions()
            .count_documents(doc! { "user_id": user_id, "completed": true }, None)
            .await?)
    }

    async fn recent_completions(&self, limit: usize) -> StoreResult<Vec<QuestCompletion>> {
        let options = FindOptions::builder()
            .sort(doc! { "completed_at": -1 })
            .limit(limit as i64)
            .build();
        let cursor = self.completions().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_polls(&self) -> StoreResult<Vec<Poll>> {
        let options = FindOptions::builder().sort(doc! { "poll_id": 1 }).build();
        let cursor = self.polls().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_poll(&self, poll_id: i64) -> StoreResult<Option<Poll>> {
        Ok(self.polls().find_one(doc! { "poll_id": poll_id }, None).await?)
    }

    async fn upsert_poll(&self, poll: &Poll) -> StoreResult<()> {
        Self::upsert(&self.polls(), doc! { "poll_id": poll.poll_id }, poll).await
    }

    async fn find_vote(&self, user_id: i64, poll_id: i64) -> StoreResult<Option<Vote>> {
        Ok(self
            .votes()
            .find_one(doc! { "user_id": user_id, "poll_id": poll_id }, None)
            .await?)
    }

    async fn insert_vote(&self, vote: &Vote) -> StoreResult<()> {
        self.votes().insert_one(vote, None).await?;
        Ok(())
    }

    async fn increment_poll_option(&self, poll_id: i64, option_index: usize) -> StoreResult<()> {
        let mut inc = Document::new();
        inc.insert(format!("options.{}.votes", option_index), 1_i64);
        self.polls()
            .update_one(doc! { "poll_id": poll_id }, doc! { "$inc": inc }, None)
            .await?;
        Ok(())
    }

    async fn list_research_posts(&self, limit: Option<usize>) -> StoreResult<Vec<ResearchPost>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit.map(|n| n as i64))
            .build();
        let cursor = self.research_posts().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_research_post(&self, mut post: ResearchPost) -> StoreResult<ResearchPost> {
        let result = self.research_posts().insert_one(&post, None).await?;
        if let Bson::ObjectId(oid) = result.inserted_id {
            post.id = Some(oid);
        }
        Ok(post)
    }

    async fn ensure_research_post(&self, post: ResearchPost) -> StoreResult<()> {
        let filter = doc! { "title": post.title.as_str() };
        let update = doc! { "$setOnInsert": bson::to_document(&post)? };
        let options = UpdateOptions::builder().upsert(true).build();
        self.research_posts().update_one(filter, update, options).await?;
        Ok(())
    }

    async fn find_dashboard(&self, faculty_id: i64) -> StoreResult<Option<FacultyDashboard>> {
        Ok(self
            .dashboards()
            .find_one(doc! { "faculty_id": faculty_id }, None)
            .await?)
    }

    async fn count_dashboards(&self, faculty_id: i64) -> StoreResult<u64> {
        Ok(self
            .dashboards()
            .count_documents(doc! { "faculty_id": faculty_id }, None)
            .await?)
    }

    async fn insert_dashboard(&self, dashboard: &FacultyDashboard) -> StoreResult<()> {
        self.dashboards().insert_one(dashboard, None).await?;
        Ok(())
    }

    async fn set_pending_reviews(&self, faculty_id: i64, pending: i64) -> StoreResult<()> {
        self.dashboards()
            .update_one(
                doc! { "faculty_id": faculty_id },
                doc! { "$set": { "overview.pending_reviews": pending } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn review_suggestion(
        &self,
        faculty_id: i64,
        suggestion_id: ObjectId,
        review: &SuggestionReview,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let set = suggestion_review_set(review, now);
        self.patch_embedded(faculty_id, "ai_suggestions", suggestion_id, set)
            .await
    }

    async fn update_mentee(
        &self,
        faculty_id: i64,
        mentee_id: ObjectId,
        update: &MenteeUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let set = mentee_set(update, now);
        self.patch_embedded(faculty_id, "mentorship.mentees", mentee_id, set)
            .await
    }

    async fn update_owned_course(
        &self,
        faculty_id: i64,
        course_id: ObjectId,
        update: &CourseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<FacultyDashboard>> {
        let set = course_set(update, now);
        self.patch_embedded(faculty_id, "courses", course_id, set).await
    }

    async fn push_mentee(
        &self,
        faculty_id: i64,
        mentee: &Mentee,
        now: DateTime<Utc>,
    ) -> StoreResult<FacultyDashboard> {
        let update = mentee_push_update(mentee, now)?;
        self.append_embedded(faculty_id, update).await
    }

    async fn push_owned_course(
        &self,
        faculty_id: i64,
        course: &OwnedCourse,
        now: DateTime<Utc>,
    ) -> StoreResult<FacultyDashboard> {
        let update = course_push_update(course, now)?;
        self.append_embedded(faculty_id, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(update: &Document, operator: &str) -> Vec<String> {
        update
            .get_document(operator)
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Two update paths collide when equal or when one is a parent of the other.
    fn collides(a: &str, b: &str) -> bool {
        a == b || a.starts_with(&format!("{}.", b)) || b.starts_with(&format!("{}.", a))
    }

    fn assert_disjoint(update: &Document) {
        let inserted = keys(update, "$setOnInsert");
        assert!(!inserted.is_empty());
        for operator in ["$push", "$set", "$inc"] {
            for path in keys(update, operator) {
                for insert_path in &inserted {
                    assert!(
                        !collides(&path, insert_path),
                        "{} {} overlaps $setOnInsert {}",
                        operator,
                        path,
                        insert_path
                    );
                }
            }
        }
    }

    #[test]
    fn malformed_user_documents_are_skipped() {
        let valid = User {
            user_id: 3,
            name: "Casey Wong".to_string(),
            coins: 11800,
            ..User::default()
        };
        let documents = vec![
            doc! { "user_id": 9, "name": "Broken", "role": "wizard" },
            bson::to_document(&valid).unwrap(),
            doc! { "user_id": "ten", "name": "Also broken" },
        ];

        let users = decode_users(documents);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, 3);
        assert_eq!(users[0].coins, 11800);
    }

    #[test]
    fn append_updates_do_not_overlap_insert_defaults() {
        let now = Utc::now();
        let mentee = Mentee {
            id: ObjectId::new(),
            name: "Eve".to_string(),
            status: "active".to_string(),
            next_session: String::new(),
            note: String::new(),
            created_at: now,
            updated_at: now,
        };
        let course = OwnedCourse {
            id: ObjectId::new(),
            title: "Seminar".to_string(),
            status: "draft".to_string(),
            code: String::new(),
            last_updated: now,
        };

        let mentee_update = mentee_push_update(&mentee, now).unwrap();
        assert_disjoint(&mentee_update);
        assert_eq!(keys(&mentee_update, "$push"), vec!["mentorship.mentees"]);
        assert_eq!(keys(&mentee_update, "$inc"), vec!["overview.students_mentored"]);

        let course_update = course_push_update(&course, now).unwrap();
        assert_disjoint(&course_update);
        assert_eq!(keys(&course_update, "$push"), vec!["courses"]);
        assert_eq!(keys(&course_update, "$inc"), vec!["overview.courses_taught"]);
    }

    #[test]
    fn positional_sets_touch_only_supplied_fields() {
        let now = Utc::now();

        let set = suggestion_review_set(
            &SuggestionReview {
                status: "approved".to_string(),
                recommendation: None,
                grade_suggestion: Some("A".to_string()),
            },
            now,
        );
        assert_eq!(set.get_str("ai_suggestions.$.status").unwrap(), "approved");
        assert_eq!(set.get_str("ai_suggestions.$.grade_suggestion").unwrap(), "A");
        assert!(!set.contains_key("ai_suggestions.$.recommendation"));

        let set = mentee_set(
            &MenteeUpdate {
                note: Some("Graduated".to_string()),
                ..MenteeUpdate::default()
            },
            now,
        );
        assert_eq!(set.get_str("mentorship.mentees.$.note").unwrap(), "Graduated");
        assert!(!set.contains_key("mentorship.mentees.$.status"));
        assert!(set.contains_key("mentorship.last_updated"));

        let set = course_set(
            &CourseUpdate {
                status: Some("published".to_string()),
                ..CourseUpdate::default()
            },
            now,
        );
        assert_eq!(set.get_str("courses.$.status").unwrap(), "published");
        assert!(!set.contains_key("courses.$.title"));

        // Every embedded path goes through the positional operator.
        for key in set.keys().filter(|k| k.starts_with("courses.")) {
            assert!(key.starts_with("courses.$."), "{}", key);
        }
    }
}
