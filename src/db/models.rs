use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub date_time: DateTime<Utc>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub password_hash: String,
    pub email: String,
    pub login_history: Vec<LoginEvent>,
    /// Bumped on every write; guards login-history updates.
    pub version: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub post_date: DateTime<Utc>,
    pub feature_image: Option<String>,
    pub published: bool,
    pub category: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub feature_image: Option<String>,
    pub published: bool,
    pub category: Option<i64>,
}

/// What to do with a post's image on edit. Exactly one applies per request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageChange {
    Remove,
    Replace(String),
    #[default]
    Keep,
}

#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: String,
    pub body: String,
    pub published: bool,
    pub category: Option<i64>,
    pub image: ImageChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Category(i64),
    MinDate(DateTime<Utc>),
    Published,
    PublishedInCategory(i64),
}

impl ImageChange {
    /// Resolve the stored image after applying this change.
    pub fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            ImageChange::Remove => None,
            ImageChange::Replace(url) => Some(url.clone()),
            ImageChange::Keep => current,
        }
    }
}
