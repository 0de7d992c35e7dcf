use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollOption {
    pub text: String,
    pub votes: i64,
}

impl PollOption {
    pub fn new(text: &str, votes: i64) -> Self {
        Self {
            text: text.to_string(),
            votes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Poll {
    pub poll_id: i64,
    pub question: String,
    pub time_left: String,
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub id: i64,
    pub question: String,
    pub time_left: String,
    pub options: Vec<PollOption>,
}

impl From<Poll> for PollView {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.poll_id,
            question: poll.question,
            time_left: poll.time_left,
            options: poll.options,
        }
    }
}

/// One per (user, poll), enforced by a lookup before insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: i64,
    pub poll_id: i64,
    pub option_index: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub voted_at: DateTime<Utc>,
}
