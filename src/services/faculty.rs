//! Faculty dashboard: one aggregate document per faculty member holding
//! mentees, owned courses and AI grading suggestions, plus course-progress
//! rollups computed over the whole student population on every read.

use std::collections::HashMap;
use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::format::{relative_timestamp, rfc3339, title_case};
use super::leaderboard::{LeaderboardEntry, LeaderboardService};
use super::{ServiceError, ServiceResult};
use crate::database::models::{
    CourseUpdate, FacultyDashboard, Mentee, MenteeUpdate, OwnedCourse, SuggestionReview,
};
use crate::database::Store;
use crate::types::Role;

const TOP_PERFORMERS: usize = 5;

// ---------------------------------------------------------------------------
// Status vocabularies

/// Storage coercion for mentee status; anything unknown becomes `active`.
pub fn normalize_mentee_status(raw: &str) -> String {
    let status = raw.trim().to_lowercase();
    match status.as_str() {
        "active" | "meeting_soon" | "archived" => status,
        _ => "active".to_string(),
    }
}

/// Storage coercion for AI suggestion status; anything unknown becomes `reviewed`.
pub fn normalize_suggestion_status(raw: &str) -> String {
    let status = raw.trim().to_lowercase();
    match status.as_str() {
        "pending" | "approved" | "needs_follow_up" | "reviewed" | "escalated" | "dismissed" => {
            status
        }
        _ => "reviewed".to_string(),
    }
}

/// Storage coercion for owned course status; anything unknown becomes `draft`.
pub fn normalize_course_status(raw: &str) -> String {
    let status = raw.trim().to_lowercase();
    match status.as_str() {
        "published" | "draft" | "archived" => status,
        _ => "draft".to_string(),
    }
}

/// Display label and tone. Unknown input echoes back title-cased with the `indigo` tone.
pub fn status_meta(status: &str) -> (String, &'static str) {
    match status.to_lowercase().as_str() {
        "published" => ("Published".to_string(), "emerald"),
        "draft" => ("Draft".to_string(), "amber"),
        "archived" => ("Archived".to_string(), "slate"),
        "meeting_soon" => ("Meeting Soon".to_string(), "amber"),
        _ => (title_case(status), "indigo"),
    }
}

/// Faculty act on their own dashboard; admins may target another one.
pub fn resolve_target(actor_id: i64, role: Role, faculty_override: Option<i64>) -> i64 {
    match (role, faculty_override) {
        (Role::Admin, Some(id)) if id > 0 => id,
        _ => actor_id,
    }
}

// ---------------------------------------------------------------------------
// Requests

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewRequest {
    pub status: String,
    pub recommendation: String,
    pub grade_suggestion: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMenteeRequest {
    pub name: String,
    pub status: String,
    pub next_session: String,
    pub note: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MenteeStatusRequest {
    pub status: Option<String>,
    pub next_session: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCourseRequest {
    pub title: String,
    pub status: String,
    pub code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CourseStatusRequest {
    pub status: Option<String>,
    pub title: Option<String>,
    pub code: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

// ---------------------------------------------------------------------------
// Response shape

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewView {
    pub courses_taught: i64,
    pub students_mentored: i64,
    pub average_grade: f64,
    pub pending_reviews: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub id: String,
    pub title: String,
    pub course: String,
    pub summary: String,
    pub recommendation: String,
    pub grade_suggestion: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGradingView {
    pub suggestions: Vec<SuggestionView>,
    pub pending_count: i64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenteeView {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub next_session: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorshipView {
    pub mentees: Vec<MenteeView>,
    pub active_count: i64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseCard {
    pub id: String,
    pub title: String,
    pub status: String,
    pub status_label: String,
    pub status_tone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsView {
    pub labels: Vec<String>,
    pub students: Vec<i64>,
    pub avg_grade: Vec<i64>,
}

/// Per-course rollup across every student's enrolments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressSummary {
    pub course_id: i64,
    pub title: String,
    pub average_progress: f64,
    pub students: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_next: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyOverview {
    pub overview: OverviewView,
    pub ai_grading: AiGradingView,
    pub mentorship: MentorshipView,
    pub courses: Vec<CourseCard>,
    pub analytics: AnalyticsView,
    pub course_progress: Vec<CourseProgressSummary>,
    pub top_performers: Vec<LeaderboardEntry>,
}

impl FacultyOverview {
    fn from_dashboard(
        doc: Option<&FacultyDashboard>,
        course_progress: Vec<CourseProgressSummary>,
        top_performers: Vec<LeaderboardEntry>,
    ) -> Self {
        let Some(doc) = doc else {
            return Self {
                overview: OverviewView::default(),
                ai_grading: AiGradingView {
                    suggestions: Vec::new(),
                    pending_count: 0,
                    last_updated: "Recently".to_string(),
                },
                mentorship: MentorshipView {
                    mentees: Vec::new(),
                    active_count: 0,
                    last_updated: "Recently".to_string(),
                },
                courses: Vec::new(),
                analytics: AnalyticsView::default(),
                course_progress,
                top_performers,
            };
        };

        let pending = doc.pending_count();

        let suggestions = doc
            .ai_suggestions
            .iter()
            .map(|s| SuggestionView {
                id: s.id.to_hex(),
                title: s.title.clone(),
                course: s.course.clone(),
                summary: s.summary.clone(),
                recommendation: s.recommendation.clone(),
                grade_suggestion: s.grade_suggestion.clone(),
                status: s.status.clone(),
                created_at: rfc3339(s.created_at),
                updated_at: rfc3339(s.updated_at),
            })
            .collect();

        let mentees: Vec<MenteeView> = doc
            .mentorship
            .mentees
            .iter()
            .map(|m| MenteeView {
                id: m.id.to_hex(),
                name: m.name.clone(),
                status: normalize_mentee_status(&m.status),
                next_session: m.next_session.clone(),
                note: m.note.clone(),
                updated_at: rfc3339(m.updated_at),
            })
            .collect();
        let active_count = mentees.iter().filter(|m| m.status != "archived").count() as i64;

        let courses = doc
            .courses
            .iter()
            .map(|c| {
                let (label, tone) = status_meta(&c.status);
                CourseCard {
                    id: c.id.to_hex(),
                    title: c.title.clone(),
                    status: c.status.clone(),
                    status_label: label,
                    status_tone: tone.to_string(),
                    code: c.code.clone(),
                    last_updated: rfc3339(c.last_updated),
                }
            })
            .collect();

        Self {
            overview: OverviewView {
                courses_taught: doc.overview.courses_taught,
                students_mentored: doc.overview.students_mentored,
                average_grade: doc.overview.average_grade,
                pending_reviews: pending,
            },
            ai_grading: AiGradingView {
                suggestions,
                pending_count: pending,
                last_updated: relative_timestamp(doc.updated_at),
            },
            mentorship: MentorshipView {
                mentees,
                active_count,
                last_updated: relative_timestamp(doc.mentorship.last_updated),
            },
            courses,
            analytics: AnalyticsView {
                labels: doc.analytics.labels.clone(),
                students: doc.analytics.students.clone(),
                avg_grade: doc.analytics.avg_grade.clone(),
            },
            course_progress,
            top_performers,
        }
    }
}

// ---------------------------------------------------------------------------
// Service

#[derive(Clone)]
pub struct FacultyService {
    store: Arc<dyn Store>,
    leaderboard: LeaderboardService,
}

impl FacultyService {
    pub fn new(store: Arc<dyn Store>, leaderboard: LeaderboardService) -> Self {
        Self { store, leaderboard }
    }

    pub async fn overview(&self, faculty_id: i64) -> ServiceResult<FacultyOverview> {
        let doc = self
            .store
            .find_dashboard(faculty_id)
            .await
            .map_err(ServiceError::store("failed to load faculty dashboard"))?;
        self.render(doc).await
    }

    pub async fn review_suggestion(
        &self,
        faculty_id: i64,
        suggestion_id: &str,
        request: ReviewRequest,
    ) -> ServiceResult<FacultyOverview> {
        let suggestion_id = ObjectId::parse_str(suggestion_id)
            .map_err(|_| ServiceError::validation("invalid suggestion id"))?;

        let review = SuggestionReview {
            status: normalize_suggestion_status(&request.status),
            recommendation: non_empty(&request.recommendation),
            grade_suggestion: non_empty(&request.grade_suggestion),
        };

        let doc = self
            .store
            .review_suggestion(faculty_id, suggestion_id, &review, Utc::now())
            .await
            .map_err(ServiceError::store("failed to update suggestion"))?
            .ok_or_else(|| ServiceError::not_found("suggestion not found"))?;
        self.render(Some(doc)).await
    }

    pub async fn add_mentee(
        &self,
        faculty_id: i64,
        request: NewMenteeRequest,
    ) -> ServiceResult<FacultyOverview> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("name is required"));
        }

        let now = Utc::now();
        let mentee = Mentee {
            id: ObjectId::new(),
            name: name.to_string(),
            status: normalize_mentee_status(&request.status),
            next_session: request.next_session.trim().to_string(),
            note: request.note.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        let doc = self
            .store
            .push_mentee(faculty_id, &mentee, now)
            .await
            .map_err(ServiceError::store("failed to add mentee"))?;
        self.render(Some(doc)).await
    }

    pub async fn update_mentee(
        &self,
        faculty_id: i64,
        mentee_id: &str,
        request: MenteeStatusRequest,
    ) -> ServiceResult<FacultyOverview> {
        let mentee_id = ObjectId::parse_str(mentee_id)
            .map_err(|_| ServiceError::validation("invalid mentee id"))?;

        let update = MenteeUpdate {
            status: request.status.as_deref().map(normalize_mentee_status),
            next_session: trimmed(request.next_session),
            note: trimmed(request.note),
        };

        let doc = self
            .store
            .update_mentee(faculty_id, mentee_id, &update, Utc::now())
            .await
            .map_err(ServiceError::store("failed to update mentee"))?
            .ok_or_else(|| ServiceError::not_found("mentee not found"))?;
        self.render(Some(doc)).await
    }

    pub async fn add_course(
        &self,
        faculty_id: i64,
        request: NewCourseRequest,
    ) -> ServiceResult<FacultyOverview> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(ServiceError::validation("title is required"));
        }

        let now = Utc::now();
        let course = OwnedCourse {
            id: ObjectId::new(),
            title: title.to_string(),
            status: normalize_course_status(&request.status),
            code: request.code.trim().to_string(),
            last_updated: now,
        };

        let doc = self
            .store
            .push_owned_course(faculty_id, &course, now)
            .await
            .map_err(ServiceError::store("failed to add course"))?;
        self.render(Some(doc)).await
    }

    pub async fn update_course(
        &self,
        faculty_id: i64,
        course_id: &str,
        request: CourseStatusRequest,
    ) -> ServiceResult<FacultyOverview> {
        let course_id = ObjectId::parse_str(course_id)
            .map_err(|_| ServiceError::validation("invalid course id"))?;

        let update = CourseUpdate {
            status: request.status.as_deref().map(normalize_course_status),
            title: trimmed(request.title),
            code: trimmed(request.code),
        };

        let doc = self
            .store
            .update_owned_course(faculty_id, course_id, &update, Utc::now())
            .await
            .map_err(ServiceError::store("failed to update course"))?
            .ok_or_else(|| ServiceError::not_found("course not found"))?;
        self.render(Some(doc)).await
    }

    /// Recompute and persist the pending count, then attach the cross-student rollups.
    async fn render(&self, mut doc: Option<FacultyDashboard>) -> ServiceResult<FacultyOverview> {
        if let Some(doc) = doc.as_mut() {
            let pending = doc.pending_count();
            doc.overview.pending_reviews = pending;
            if let Err(e) = self.store.set_pending_reviews(doc.faculty_id, pending).await {
                warn!("failed to persist pending review count for faculty {}: {}", doc.faculty_id, e);
            }
        }

        let course_progress = self.course_progress().await?;
        let top_performers = self
            .leaderboard
            .top(Some(TOP_PERFORMERS))
            .await
            .map_err(ServiceError::store("failed to load leaderboard"))?;

        Ok(FacultyOverview::from_dashboard(
            doc.as_ref(),
            course_progress,
            top_performers,
        ))
    }

    /// Full scan of student enrolments grouped by course id, sorted by average progress.
    /// Ties keep no particular order.
    pub async fn course_progress(&self) -> ServiceResult<Vec<CourseProgressSummary>> {
        #[derive(Default)]
        struct Tally {
            title: String,
            total_progress: i64,
            students: i64,
            due_next: String,
        }

        let students = self
            .store
            .list_users_by_role(Role::Student)
            .await
            .map_err(ServiceError::store("failed to load course progress"))?;

        let mut tallies: HashMap<i64, Tally> = HashMap::new();
        for student in &students {
            for course in &student.active_courses {
                let tally = tallies.entry(course.course_id).or_default();
                tally.title = course.title.clone();
                tally.total_progress += course.progress;
                tally.students += 1;
                if !course.due_next.is_empty() {
                    tally.due_next = course.due_next.clone();
                }
            }
        }

        let mut summaries: Vec<CourseProgressSummary> = tallies
            .into_iter()
            .map(|(course_id, tally)| CourseProgressSummary {
                course_id,
                title: tally.title,
                average_progress: if tally.students > 0 {
                    tally.total_progress as f64 / tally.students as f64
                } else {
                    0.0
                },
                students: tally.students,
                due_next: tally.due_next,
            })
            .collect();
        summaries.sort_unstable_by(|a, b| {
            b.average_progress
                .partial_cmp(&a.average_progress)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(summaries)
    }
}
