use anyhow::{Context, Result};
use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use tracing::info;

use super::models::{
    AiSuggestion, Analytics, CourseProgress, FacultyDashboard, Mentee, Mentorship, OverviewStats,
    OwnedCourse, Poll, PollOption, Quest, QuestCompletion, ResearchPost, User,
};
use super::Store;
use crate::auth::hash_password;
use crate::types::Role;

pub const SEED_FACULTY_ID: i64 = 6;

struct SeedUser {
    user_id: i64,
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
    coins: i64,
    streak: i64,
    metrics: (i64, i64, i64),
    courses: Vec<CourseProgress>,
}

fn seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            user_id: 1,
            name: "Alex Sharma",
            email: "alex@learnonline.edu",
            password: "student123",
            role: Role::Student,
            coins: 11250,
            streak: 14,
            metrics: (90, 60, 75),
            courses: vec![
                CourseProgress::new(101, "Introduction to AI", 75).with_schedule("Dr. Sen", "Module 3 Quiz"),
                CourseProgress::new(102, "Machine Learning Basics", 40).with_schedule("Prof. Singh", "Peer Review"),
                CourseProgress::new(103, "Data Structures & Algorithms", 90).with_schedule("Dr. Mehta", "Assignment 4"),
            ],
        },
        SeedUser {
            user_id: 2,
            name: "Jordan Lee",
            email: "jordan@learnonline.edu",
            password: "student123",
            role: Role::Student,
            coins: 12500,
            streak: 18,
            metrics: (92, 72, 82),
            courses: vec![
                CourseProgress::new(104, "Advanced Robotics", 68).with_schedule("Dr. Tan", "Lab Report"),
            ],
        },
        SeedUser {
            user_id: 3,
            name: "Casey Wong",
            email: "casey@learnonline.edu",
            password: "student123",
            role: Role::Student,
            coins: 11800,
            streak: 12,
            metrics: (88, 65, 70),
            courses: Vec::new(),
        },
        SeedUser {
            user_id: 4,
            name: "Taylor Green",
            email: "taylor@learnonline.edu",
            password: "student123",
            role: Role::Student,
            coins: 10900,
            streak: 10,
            metrics: (86, 59, 66),
            courses: Vec::new(),
        },
        SeedUser {
            user_id: 5,
            name: "Samira Khan",
            email: "samira@learnonline.edu",
            password: "student123",
            role: Role::Student,
            coins: 10100,
            streak: 8,
            metrics: (84, 55, 60),
            courses: Vec::new(),
        },
        SeedUser {
            user_id: SEED_FACULTY_ID,
            name: "Dr. Meera Iyer",
            email: "meera@learnonline.edu",
            password: "faculty123",
            role: Role::Faculty,
            coins: 5400,
            streak: 6,
            metrics: (0, 0, 0),
            courses: vec![
                CourseProgress::new(101, "Introduction to AI", 0),
                CourseProgress::new(104, "Advanced Robotics", 0),
            ],
        },
        SeedUser {
            user_id: 7,
            name: "Admin User",
            email: "admin@learnonline.edu",
            password: "admin123",
            role: Role::Admin,
            coins: 6000,
            streak: 4,
            metrics: (0, 0, 0),
            courses: Vec::new(),
        },
    ]
}

fn quest(quest_id: i64, title: &str, question: &str, icon: &str, difficulty: &str, coins: i64) -> Quest {
    Quest {
        quest_id,
        title: title.to_string(),
        question: question.to_string(),
        answer: String::new(),
        icon: icon.to_string(),
        difficulty: difficulty.to_string(),
        coins,
    }
}

fn seed_quests() -> Vec<Quest> {
    vec![
        quest(1, "Complete Module 3 Quiz", "Finish the quiz for \"Introduction to AI\"", "✅", "Easy", 50),
        quest(2, "Review 3 Peer Submissions", "Provide feedback on research projects", "📝", "Medium", 75),
        quest(3, "Participate in Forum Discussion", "Post a question or answer in \"Machine Learning Basics\"", "💬", "Easy", 25),
        quest(4, "Lab Prep", "Read the robotics lab brief before tomorrow", "🤖", "Medium", 40),
    ]
}

fn seed_polls() -> Vec<Poll> {
    vec![
        Poll {
            poll_id: 1,
            question: "What should be our next cafeteria menu addition?".to_string(),
            time_left: "2 days left".to_string(),
            options: vec![
                PollOption::new("South Indian Thali", 45),
                PollOption::new("Mexican Fiesta", 32),
                PollOption::new("Mediterranean Bowl", 28),
                PollOption::new("Asian Fusion", 25),
            ],
        },
        Poll {
            poll_id: 2,
            question: "Which sustainability initiative should we prioritize?".to_string(),
            time_left: "5 days left".to_string(),
            options: vec![
                PollOption::new("Solar Panel Installation", 52),
                PollOption::new("Campus Recycling Program", 48),
                PollOption::new("Tree Plantation Drive", 38),
            ],
        },
    ]
}

struct SeedPost {
    title: &'static str,
    text: &'static str,
    category: &'static str,
    tags: [&'static str; 3],
    image_url: &'static str,
    author_id: i64,
    author_name: &'static str,
    author_role: &'static str,
    is_collaboration: bool,
    engagement: (i64, i64, i64),
    hours_ago: i64,
}

fn seed_posts() -> Vec<SeedPost> {
    vec![
        SeedPost {
            title: "Breakthrough in AI-driven sustainable agriculture",
            text: "Our team published a paper on using neural networks to optimize crop rotation for improved yield and reduced environmental impact.",
            category: "Collaboration",
            tags: ["AI", "Sustainability", "AgriTech"],
            image_url: "https://images.unsplash.com/photo-1498050108023-c5249f4df085?auto=format&fit=crop&w=1200&q=80",
            author_id: SEED_FACULTY_ID,
            author_name: "Dr. Evelyn Reed",
            author_role: "Lead Researcher · AI Sustainability Lab",
            is_collaboration: true,
            engagement: (25, 18, 3),
            hours_ago: 2,
        },
        SeedPost {
            title: "Need insight on quantum coherence times",
            text: "We're optimizing qubit coherence times under noisy conditions and looking for collaborators who can share resources or simulation tooling.",
            category: "Collaboration",
            tags: ["Quantum", "Physics", "Research"],
            image_url: "",
            author_id: 1,
            author_name: "Maria Sanchez",
            author_role: "PhD Candidate · Quantum Computing",
            is_collaboration: true,
            engagement: (18, 9, 5),
            hours_ago: 26,
        },
        SeedPost {
            title: "Validating a new compound for neurological disorders",
            text: "Preliminary results from our clinical validation look promising. Preparing for peer review and open to feedback before submission.",
            category: "My Research",
            tags: ["Neuroscience", "Drug Discovery", "Biotech"],
            image_url: "https://images.unsplash.com/photo-1559750981-10ef0c45f05b?auto=format&fit=crop&w=1200&q=80",
            author_id: 2,
            author_name: "Sarah Williams",
            author_role: "Research Fellow · NeuroLab",
            is_collaboration: false,
            engagement: (42, 12, 6),
            hours_ago: 72,
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn suggestion(
    title: &str,
    course: &str,
    summary: &str,
    recommendation: &str,
    grade: &str,
    status: &str,
    created_hours_ago: i64,
    updated_hours_ago: i64,
) -> AiSuggestion {
    let now = Utc::now();
    AiSuggestion {
        id: ObjectId::new(),
        title: title.to_string(),
        course: course.to_string(),
        summary: summary.to_string(),
        recommendation: recommendation.to_string(),
        grade_suggestion: grade.to_string(),
        status: status.to_string(),
        created_at: now - Duration::hours(created_hours_ago),
        updated_at: now - Duration::hours(updated_hours_ago),
    }
}

fn mentee(name: &str, status: &str, next_session: &str, note: &str, created_days_ago: i64, updated_hours_ago: i64) -> Mentee {
    let now = Utc::now();
    Mentee {
        id: ObjectId::new(),
        name: name.to_string(),
        status: status.to_string(),
        next_session: next_session.to_string(),
        note: note.to_string(),
        created_at: now - Duration::days(created_days_ago),
        updated_at: now - Duration::hours(updated_hours_ago),
    }
}

fn owned_course(title: &str, status: &str, code: &str, hours_ago: i64) -> OwnedCourse {
    OwnedCourse {
        id: ObjectId::new(),
        title: title.to_string(),
        status: status.to_string(),
        code: code.to_string(),
        last_updated: Utc::now() - Duration::hours(hours_ago),
    }
}

pub fn sample_dashboard(faculty_id: i64) -> FacultyDashboard {
    let now = Utc::now();
    FacultyDashboard {
        id: None,
        faculty_id,
        overview: OverviewStats {
            courses_taught: 12,
            students_mentored: 48,
            average_grade: 92.0,
            pending_reviews: 3,
        },
        ai_suggestions: vec![
            suggestion(
                "Research Paper on Quantum Computing",
                "Advanced Physics",
                "AI summary: AI suggests minor grammatical corrections and highlights a weak conclusion argument.",
                "Add real-world examples to strengthen the final section and provide a clearer thesis recap.",
                "B+",
                "pending",
                10,
                10,
            ),
            suggestion(
                "Midterm Exam Essay: Impact of AI on Society",
                "Ethics in Technology",
                "AI summary: AI identifies strong arguments but recommends more diverse real-world examples.",
                "Encourage student to reference at least two global policy frameworks to add depth.",
                "A-",
                "pending",
                26,
                26,
            ),
            suggestion(
                "Programming Project: Secure Messaging App",
                "Software Engineering",
                "AI summary: AI detected a potential security vulnerability in the authentication module.",
                "Added human review. Grade suggestion: C. Provide targeted remediation steps.",
                "C",
                "needs_follow_up",
                72,
                6,
            ),
        ],
        mentorship: Mentorship {
            mentees: vec![
                mentee("Alice Johnson", "active", "Mon, Oct 02, 10:00 AM", "AI Ethics project review", 30, 24),
                mentee("Bob Williams", "meeting_soon", "Wed, Oct 04, 3:30 PM", "Capstone guidance", 14, 3),
                mentee("Charlie Davis", "active", "Fri, Nov 01, 11:00 AM", "Grant proposal outline", 45, 48),
                mentee("Diana Smith", "archived", "", "Graduated", 120, 60 * 24),
            ],
            last_updated: now,
        },
        courses: vec![
            owned_course("Introduction to Computer Science", "published", "CS101", 72),
            owned_course("Calculus II", "published", "MTH202", 48),
            owned_course("Ethics in AI", "draft", "ETH310", 12),
            owned_course("World History: Ancient Civilizations", "archived", "HIS210", 240),
        ],
        analytics: Analytics {
            labels: ["Jan", "Feb", "Mar", "Apr", "May"].iter().map(|s| s.to_string()).collect(),
            students: vec![120, 132, 128, 140, 152],
            avg_grade: vec![88, 87, 89, 90, 92],
        },
        created_at: now,
        updated_at: now,
    }
}

/// Ensure the demo data set exists. Users, quests, polls and completions are
/// upserted by key; posts are inserted once by title; the faculty dashboard is
/// only created when absent.
pub async fn seed_sample_data(store: &dyn Store, bcrypt_cost: u32) -> Result<()> {
    for seed in seed_users() {
        let (academic_standing, gamification_level, course_progress) = seed.metrics;
        let password_hash = hash_password(seed.password, bcrypt_cost)
            .with_context(|| format!("failed to hash password for {}", seed.email))?;
        let user = User {
            user_id: seed.user_id,
            name: seed.name.to_string(),
            email: seed.email.to_lowercase(),
            password_hash,
            role: seed.role,
            coins: seed.coins,
            streak: seed.streak,
            academic_standing,
            gamification_level,
            course_progress,
            active_courses: seed.courses,
        };
        store
            .upsert_user(&user)
            .await
            .with_context(|| format!("failed to upsert user {}", seed.email))?;
    }

    for quest in seed_quests() {
        store
            .upsert_quest(&quest)
            .await
            .with_context(|| format!("failed to upsert quest {}", quest.quest_id))?;
    }

    for poll in seed_polls() {
        store
            .upsert_poll(&poll)
            .await
            .with_context(|| format!("failed to upsert poll {}", poll.poll_id))?;
    }

    let now = Utc::now();
    for (user_id, quest_id, hours_ago) in [(1, 1, 48), (2, 2, 24)] {
        let completion = QuestCompletion::new(user_id, quest_id, now - Duration::hours(hours_ago));
        store
            .upsert_completion(&completion)
            .await
            .with_context(|| format!("failed to upsert completion {}/{}", user_id, quest_id))?;
    }

    for seed in seed_posts() {
        let (likes, comments, collaborations) = seed.engagement;
        let created_at = now - Duration::hours(seed.hours_ago);
        let post = ResearchPost {
            id: None,
            author_id: seed.author_id,
            author_name: seed.author_name.to_string(),
            author_role: seed.author_role.to_string(),
            title: seed.title.to_string(),
            summary: seed.text.to_string(),
            body: seed.text.to_string(),
            category: seed.category.to_string(),
            tags: seed.tags.iter().map(|t| t.to_string()).collect(),
            image_url: seed.image_url.to_string(),
            link: String::new(),
            likes,
            comments,
            collaborations,
            is_collaboration: seed.is_collaboration,
            created_at,
            updated_at: created_at,
        };
        store
            .ensure_research_post(post)
            .await
            .with_context(|| format!("failed to ensure research post {}", seed.title))?;
    }

    if store.count_dashboards(SEED_FACULTY_ID).await? == 0 {
        store
            .insert_dashboard(&sample_dashboard(SEED_FACULTY_ID))
            .await
            .context("failed to insert faculty dashboard seed")?;
    }

    info!("sample data ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let store = MemoryStore::new();
        seed_sample_data(&store, 4).await.unwrap();
        seed_sample_data(&store, 4).await.unwrap();

        assert_eq!(store.count_users(None).await.unwrap(), 7);
        assert_eq!(store.count_quests().await.unwrap(), 4);
        assert_eq!(store.list_research_posts(None).await.unwrap().len(), 3);
        assert_eq!(store.count_dashboards(SEED_FACULTY_ID).await.unwrap(), 1);
        assert_eq!(store.recent_completions(10).await.unwrap().len(), 2);
    }

    #[test]
    fn sample_dashboard_has_expected_shape() {
        let doc = sample_dashboard(SEED_FACULTY_ID);
        assert_eq!(doc.ai_suggestions.len(), 3);
        assert_eq!(doc.pending_count(), 2);
        assert_eq!(doc.mentorship.mentees.len(), 4);
        assert_eq!(doc.courses.len(), 4);
    }
}
