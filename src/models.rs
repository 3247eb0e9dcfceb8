// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Id = i64;

/// Parses a raw identifier. Anything that is not an integer is a lookup miss, not a format error.
pub fn parse_id(raw: &str) -> Option<Id> {
    raw.trim().parse().ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub total_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: Id,
    pub poll_id: Id,
    pub text: String,
    pub vote_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Id,
    pub poll_id: Id,
    pub option_id: Id,
    pub voter: String,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPoll {
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewPoll {
    /// A fresh, active poll with no description.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOption {
    pub poll_id: Id,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub poll_id: Id,
    pub option_id: Id,
    pub voter: String,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PollFilter {
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct VoteFilter {
    pub poll_id: Id,
    pub voter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollWithOptions {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionResult {
    pub id: Id,
    pub text: String,
    pub vote_count: i64,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub poll_id: Id,
    pub title: String,
    pub description: String,
    pub total_votes: i64,
    pub options: Vec<OptionResult>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreatePollRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Clients send option ids either as JSON numbers or as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn as_raw(&self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub option_id: Option<RawId>,
}
