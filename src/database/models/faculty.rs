use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregate document per faculty member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacultyDashboard {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub faculty_id: i64,
    pub overview: OverviewStats,
    pub ai_suggestions: Vec<AiSuggestion>,
    pub mentorship: Mentorship,
    pub courses: Vec<OwnedCourse>,
    pub analytics: Analytics,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewStats {
    pub courses_taught: i64,
    pub students_mentored: i64,
    pub average_grade: f64,
    /// Derived; recomputed from `ai_suggestions` on every read.
    pub pending_reviews: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSuggestion {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub course: String,
    pub summary: String,
    pub recommendation: String,
    pub grade_suggestion: String,
    pub status: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mentorship {
    pub mentees: Vec<Mentee>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mentee {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub next_session: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Course owned by a faculty member, distinct from a student's enrolment record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnedCourse {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub labels: Vec<String>,
    pub students: Vec<i64>,
    pub avg_grade: Vec<i64>,
}

impl FacultyDashboard {
    /// Empty document for a faculty member, used when the first mutation creates it.
    pub fn empty(faculty_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            faculty_id,
            mentorship: Mentorship {
                mentees: Vec::new(),
                last_updated: now,
            },
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn pending_count(&self) -> i64 {
        self.ai_suggestions
            .iter()
            .filter(|s| s.status.eq_ignore_ascii_case("pending"))
            .count() as i64
    }
}

/// Fields touched by an AI-suggestion review. `None` leaves the stored value alone.
#[derive(Debug, Clone)]
pub struct SuggestionReview {
    pub status: String,
    pub recommendation: Option<String>,
    pub grade_suggestion: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MenteeUpdate {
    pub status: Option<String>,
    pub next_session: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CourseUpdate {
    pub status: Option<String>,
    pub title: Option<String>,
    pub code: Option<String>,
}

impl AiSuggestion {
    pub fn apply(&mut self, review: &SuggestionReview, now: DateTime<Utc>) {
        self.status = review.status.clone();
        if let Some(recommendation) = &review.recommendation {
            self.recommendation = recommendation.clone();
        }
        if let Some(grade) = &review.grade_suggestion {
            self.grade_suggestion = grade.clone();
        }
        self.updated_at = now;
    }
}

impl Mentee {
    pub fn apply(&mut self, update: &MenteeUpdate, now: DateTime<Utc>) {
        if let Some(status) = &update.status {
            self.status = status.clone();
        }
        if let Some(next_session) = &update.next_session {
            self.next_session = next_session.clone();
        }
        if let Some(note) = &update.note {
            self.note = note.clone();
        }
        self.updated_at = now;
    }
}

impl OwnedCourse {
    pub fn apply(&mut self, update: &CourseUpdate, now: DateTime<Utc>) {
        if let Some(status) = &update.status {
            self.status = status.clone();
        }
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(code) = &update.code {
            self.code = code.clone();
        }
        self.last_updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(status: &str) -> AiSuggestion {
        AiSuggestion {
            id: ObjectId::new(),
            status: status.to_string(),
            ..AiSuggestion::default()
        }
    }

    #[test]
    fn pending_count_ignores_case() {
        let mut doc = FacultyDashboard::empty(6, Utc::now());
        doc.ai_suggestions = vec![suggestion("pending"), suggestion("PENDING"), suggestion("reviewed")];
        assert_eq!(doc.pending_count(), 2);
    }

    #[test]
    fn review_keeps_untouched_fields() {
        let mut s = suggestion("pending");
        s.recommendation = "original".into();
        s.grade_suggestion = "B+".into();

        let review = SuggestionReview {
            status: "approved".into(),
            recommendation: None,
            grade_suggestion: Some("A-".into()),
        };
        s.apply(&review, Utc::now());

        assert_eq!(s.status, "approved");
        assert_eq!(s.recommendation, "original");
        assert_eq!(s.grade_suggestion, "A-");
    }

    #[test]
    fn dashboard_round_trips_through_bson() {
        let mut doc = FacultyDashboard::empty(6, Utc::now());
        doc.mentorship.mentees.push(Mentee {
            id: ObjectId::new(),
            name: "Alice Johnson".into(),
            status: "active".into(),
            ..Mentee::default()
        });

        let raw = bson::to_document(&doc).unwrap();
        assert!(raw.get("_id").is_none());
        assert!(raw.get_datetime("created_at").is_ok());

        let back: FacultyDashboard = bson::from_document(raw).unwrap();
        assert_eq!(back.faculty_id, 6);
        assert_eq!(back.mentorship.mentees[0].name, "Alice Johnson");
    }
}
