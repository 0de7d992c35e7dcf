pub mod faculty;
pub mod poll;
pub mod quest;
pub mod research;
pub mod user;

pub use faculty::{
    AiSuggestion, Analytics, CourseUpdate, FacultyDashboard, Mentee, MenteeUpdate, Mentorship,
    OverviewStats, OwnedCourse, SuggestionReview,
};
pub use poll::{Poll, PollOption, PollView, Vote};
pub use quest::{Quest, QuestCompletion, QuestView};
pub use research::{ResearchPost, ResearchPostAuthor, ResearchPostStats, ResearchPostView};
pub use user::{CourseProgress, CourseProgressView, PublicUser, User};
