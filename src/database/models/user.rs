use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Enrolment record embedded in a user document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseProgress {
    pub course_id: i64,
    pub title: String,
    pub progress: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instructor: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_next: String,
}

impl CourseProgress {
    pub fn new(course_id: i64, title: &str, progress: i64) -> Self {
        Self {
            course_id,
            title: title.to_string(),
            progress,
            ..Self::default()
        }
    }

    pub fn with_schedule(mut self, instructor: &str, due_next: &str) -> Self {
        self.instructor = instructor.to_string();
        self.due_next = due_next.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    /// Always stored lower-cased.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub coins: i64,
    pub streak: i64,
    pub academic_standing: i64,
    pub gamification_level: i64,
    pub course_progress: i64,
    pub active_courses: Vec<CourseProgress>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            user_id: 0,
            name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            role: Role::Student,
            coins: 0,
            streak: 0,
            academic_standing: 0,
            gamification_level: 0,
            course_progress: 0,
            active_courses: Vec::new(),
        }
    }
}

/// Client-facing projection of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub coins: i64,
    pub streak: i64,
    pub role: Role,
    pub academic_standing: i64,
    pub gamification_level: i64,
    pub course_progress: i64,
    pub active_courses: Vec<CourseProgressView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressView {
    pub course_id: i64,
    pub title: String,
    pub progress: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instructor: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_next: String,
}

impl From<&CourseProgress> for CourseProgressView {
    fn from(course: &CourseProgress) -> Self {
        Self {
            course_id: course.course_id,
            title: course.title.clone(),
            progress: course.progress,
            instructor: course.instructor.clone(),
            due_next: course.due_next.clone(),
        }
    }
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            coins: user.coins,
            streak: user.streak,
            role: user.role,
            academic_standing: user.academic_standing,
            gamification_level: user.gamification_level,
            course_progress: user.course_progress,
            active_courses: user.active_courses.iter().map(CourseProgressView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_projection_hides_hash() {
        let user = User {
            user_id: 3,
            name: "Casey Wong".into(),
            email: "casey@learnonline.edu".into(),
            password_hash: "$2b$04$secret".into(),
            active_courses: vec![CourseProgress::new(101, "Introduction to AI", 75)],
            ..User::default()
        };

        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["activeCourses"][0]["courseId"], 101);
        assert!(json["activeCourses"][0].get("dueNext").is_none());
        assert_eq!(json["role"], "student");
    }
}
