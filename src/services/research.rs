use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;

use super::format::{
    derive_title, ensure_url_scheme, extract_hashtags, merge_unique, relative_timestamp, rfc3339,
    sanitize_tags, truncate_text, MAX_TAGS,
};
use super::{ServiceError, ServiceResult};
use crate::database::models::{
    ResearchPost, ResearchPostAuthor, ResearchPostStats, ResearchPostView, User,
};
use crate::database::Store;
use crate::types::Role;

const SUMMARY_LIMIT: usize = 320;
const TITLE_LIMIT: usize = 120;
const FALLBACK_SUMMARY: &str = "An exciting research update from our community.";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPostRequest {
    pub title: String,
    pub summary: String,
    pub body: String,
    pub category: String,
    pub link: String,
    pub image: String,
    pub author_role: String,
    pub tags: Vec<String>,
    pub is_collaboration: Option<bool>,
}

/// Research feed shared by every role.
#[derive(Clone)]
pub struct ResearchService {
    store: Arc<dyn Store>,
}

impl ResearchService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Newest first. `None` (or a non-positive limit upstream) returns every post.
    pub async fn feed(
        &self,
        viewer_id: i64,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<ResearchPostView>> {
        let posts = self
            .store
            .list_research_posts(limit.filter(|l| *l > 0))
            .await
            .map_err(ServiceError::store("failed to load research posts"))?;
        Ok(posts.iter().map(|post| render_post(post, viewer_id)).collect())
    }

    pub async fn create(
        &self,
        author_id: i64,
        request: NewPostRequest,
    ) -> ServiceResult<ResearchPostView> {
        let author = self
            .store
            .find_user(author_id)
            .await
            .map_err(ServiceError::store("failed to load user"))?
            .ok_or_else(|| ServiceError::not_found("user not found"))?;

        let post = build_post(&author, request, Utc::now())?;
        let saved = self
            .store
            .insert_research_post(post)
            .await
            .map_err(ServiceError::store("failed to save post"))?;

        tracing::info!("research post {:?} created by user {}", saved.id, author_id);
        Ok(render_post(&saved, author_id))
    }
}

fn build_post(
    author: &User,
    request: NewPostRequest,
    now: chrono::DateTime<Utc>,
) -> ServiceResult<ResearchPost> {
    let title = request.title.trim();
    let summary = request.summary.trim();
    let body = [request.body.trim(), summary, title]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .ok_or_else(|| ServiceError::validation("content is required"))?
        .to_string();

    let summary = if summary.is_empty() {
        truncate_text(&body, SUMMARY_LIMIT)
    } else {
        truncate_text(summary, SUMMARY_LIMIT)
    };
    let title = if title.is_empty() {
        derive_title(&body)
    } else {
        truncate_text(title, TITLE_LIMIT)
    };

    let is_collaboration = request
        .is_collaboration
        .unwrap_or_else(|| request.category.trim().eq_ignore_ascii_case("collaboration"));
    let tags = merge_unique(
        &sanitize_tags(&request.tags),
        &extract_hashtags(&body),
        MAX_TAGS,
    );

    Ok(ResearchPost {
        id: None,
        author_id: author.user_id,
        author_name: author.name.clone(),
        author_role: author_role_label(author, &request.author_role),
        title,
        summary,
        body,
        category: normalize_category(&request.category, is_collaboration),
        tags,
        image_url: ensure_url_scheme(&request.image),
        link: ensure_url_scheme(&request.link),
        likes: 0,
        comments: 0,
        collaborations: 0,
        is_collaboration,
        created_at: now,
        updated_at: now,
    })
}

pub fn normalize_category(raw: &str, is_collaboration: bool) -> String {
    let category = raw.trim();
    if category.is_empty() {
        return if is_collaboration {
            "Collaboration".to_string()
        } else {
            "My Research".to_string()
        };
    }
    match category.to_lowercase().as_str() {
        "collaboration" | "collaborations" | "collab" | "team-up" => "Collaboration".to_string(),
        "my research" | "research" | "personal" => "My Research".to_string(),
        "trending" => "Trending".to_string(),
        _ => category.to_string(),
    }
}

fn author_role_label(user: &User, requested: &str) -> String {
    let requested = requested.trim();
    if !requested.is_empty() {
        return requested.to_string();
    }
    match user.role {
        Role::Faculty => "Faculty Mentor".to_string(),
        Role::Admin => "Administrator".to_string(),
        Role::Student => match user.active_courses.first() {
            Some(course) => format!("Student · {}", course.title),
            None => "Student Researcher".to_string(),
        },
    }
}

/// likes + comments + 3 × collaborations; 30 always trends, 12 trends while the post is under 72 hours old.
pub fn is_trending(post: &ResearchPost) -> bool {
    let score = post.likes + post.comments + post.collaborations * 3;
    score >= 30 || (score >= 12 && Utc::now() - post.created_at <= Duration::hours(72))
}

pub fn render_post(post: &ResearchPost, viewer_id: i64) -> ResearchPostView {
    let id = match &post.id {
        Some(oid) => oid.to_hex(),
        None => format!(
            "research-{}",
            post.created_at.timestamp_nanos_opt().unwrap_or_default()
        ),
    };

    let title = match post.title.trim() {
        "" => derive_title(&post.body),
        title => title.to_string(),
    };
    let summary = match post.summary.trim() {
        "" => truncate_text(&post.body, SUMMARY_LIMIT),
        summary => summary.to_string(),
    };
    let summary = if summary.is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        summary
    };

    ResearchPostView {
        id,
        title,
        summary,
        category: normalize_category(&post.category, post.is_collaboration),
        tags: sanitize_tags(&post.tags),
        author: ResearchPostAuthor {
            name: post.author_name.clone(),
            role: post.author_role.clone(),
        },
        timestamp: relative_timestamp(post.created_at),
        created_at: if post.created_at.timestamp() > 0 {
            rfc3339(post.created_at)
        } else {
            String::new()
        },
        image: post.image_url.trim().to_string(),
        link: post.link.trim().to_string(),
        stats: ResearchPostStats {
            likes: post.likes,
            comments: post.comments,
            collaborations: post.collaborations,
        },
        is_collaboration: post.is_collaboration,
        is_mine: post.author_id == viewer_id,
        trending: is_trending(post),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CourseProgress;
    use crate::database::{seed, MemoryStore};

    async fn service() -> ResearchService {
        let store = MemoryStore::new();
        seed::seed_sample_data(&store, 4).await.unwrap();
        ResearchService::new(Arc::new(store))
    }

    fn student() -> User {
        User {
            user_id: 1,
            name: "Alex Sharma".into(),
            role: Role::Student,
            active_courses: vec![CourseProgress::new(101, "Introduction to AI", 75)],
            ..User::default()
        }
    }

    fn post(likes: i64, comments: i64, collaborations: i64, hours_ago: i64) -> ResearchPost {
        let created_at = Utc::now() - Duration::hours(hours_ago);
        ResearchPost {
            id: None,
            author_id: 1,
            author_name: "Alex".into(),
            author_role: String::new(),
            title: String::new(),
            summary: String::new(),
            body: "Body text".into(),
            category: String::new(),
            tags: Vec::new(),
            image_url: String::new(),
            link: String::new(),
            likes,
            comments,
            collaborations,
            is_collaboration: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn categories_collapse_to_labels() {
        assert_eq!(normalize_category(" collab ", false), "Collaboration");
        assert_eq!(normalize_category("Personal", true), "My Research");
        assert_eq!(normalize_category("", true), "Collaboration");
        assert_eq!(normalize_category("", false), "My Research");
        assert_eq!(normalize_category("Robotics", false), "Robotics");
    }

    #[test]
    fn trending_thresholds() {
        assert!(is_trending(&post(20, 4, 2, 500)));
        assert!(is_trending(&post(6, 3, 1, 10)));
        assert!(!is_trending(&post(6, 3, 1, 100)));
        assert!(!is_trending(&post(5, 2, 1, 1)));
    }

    #[test]
    fn body_falls_back_and_fields_are_derived() {
        let request = NewPostRequest {
            summary: "  Line one\nwith #AI and #quantum-physics ".into(),
            tags: vec!["#ai".into(), "machine learning".into()],
            category: "Collaboration".into(),
            link: "example.org/paper".into(),
            ..NewPostRequest::default()
        };
        let post = build_post(&student(), request, Utc::now()).unwrap();

        assert_eq!(post.body, "Line one\nwith #AI and #quantum-physics");
        assert_eq!(post.title, "Line one");
        assert_eq!(post.tags, vec!["ai", "machine-learning", "quantum-physics"]);
        assert!(post.is_collaboration);
        assert_eq!(post.category, "Collaboration");
        assert_eq!(post.link, "https://example.org/paper");
        assert_eq!(post.author_role, "Student · Introduction to AI");
    }

    #[test]
    fn empty_content_is_rejected() {
        let err = build_post(&student(), NewPostRequest::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "content is required"));
    }

    #[test]
    fn explicit_flag_wins_over_category() {
        let request = NewPostRequest {
            body: "text".into(),
            category: "collaboration".into(),
            is_collaboration: Some(false),
            author_role: " Visiting Scholar ".into(),
            ..NewPostRequest::default()
        };
        let post = build_post(&student(), request, Utc::now()).unwrap();
        assert!(!post.is_collaboration);
        assert_eq!(post.category, "Collaboration");
        assert_eq!(post.author_role, "Visiting Scholar");
    }

    #[test]
    fn long_summary_is_truncated_with_ellipsis() {
        let request = NewPostRequest {
            body: "x".repeat(400),
            ..NewPostRequest::default()
        };
        let post = build_post(&student(), request, Utc::now()).unwrap();
        assert_eq!(post.summary.chars().count(), SUMMARY_LIMIT + 1);
        assert!(post.summary.ends_with('…'));
    }

    #[tokio::test]
    async fn feed_is_newest_first_and_marks_viewer_posts() {
        let research = service().await;
        let feed = research.feed(1, None).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].title, "Breakthrough in AI-driven sustainable agriculture");
        assert!(feed[0].trending);
        assert!(feed[1].is_mine);
        assert!(!feed[0].is_mine);

        assert_eq!(research.feed(1, Some(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_puts_post_at_top_of_feed() {
        let research = service().await;
        let created = research
            .create(
                6,
                NewPostRequest {
                    body: "Sharing lab notes #robotics".into(),
                    ..NewPostRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(created.is_mine);
        assert_eq!(created.author.role, "Faculty Mentor");
        assert_eq!(created.tags, vec!["robotics"]);
        assert_eq!(created.category, "My Research");

        let feed = research.feed(2, None).await.unwrap();
        assert_eq!(feed[0].id, created.id);
        assert!(!feed[0].is_mine);
    }

    #[tokio::test]
    async fn create_for_unknown_author_is_not_found() {
        let research = service().await;
        let err = research
            .create(404, NewPostRequest { body: "text".into(), ..NewPostRequest::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
