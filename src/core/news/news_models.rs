// News domain models - public news items and user comments.

use crate::core::access::{Owned, UserKey};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How many news items the home page shows by default.
pub const NEWS_COUNT_ON_HOME_PAGE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: u64,
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
}

/// A news item to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNews {
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    /// The news item this comment belongs to
    pub news_id: u64,
    pub author: UserKey,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Owned for Comment {
    fn owner(&self) -> UserKey {
        self.author
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub news_id: u64,
    pub author: UserKey,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Raw comment form as submitted by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A news item with its comments, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<Comment>,
}
