//! Flattened view data handed to the templates.

use std::sync::LazyLock;

use regex::Regex;

use crate::auth::SessionUser;
use crate::db::models::{Category, LoginEvent, Post};

/// Navigation state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub user: Option<SessionUser>,
    /// First path segment with a leading slash, e.g. `/posts`.
    pub active: String,
}

impl Nav {
    pub fn for_path(path: &str, user: Option<SessionUser>) -> Self {
        let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
        Self {
            user,
            active: format!("/{first}"),
        }
    }

    pub fn is_active(&self, route: &str) -> bool {
        self.active == route
    }

    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_name(&self) -> &str {
        self.user.as_ref().map(|u| u.user_name.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub excerpt: String,
    pub date: String,
    pub image: Option<String>,
    pub published: bool,
    pub category_id: Option<i64>,
    pub category_name: String,
}

impl PostView {
    pub fn new(post: Post, categories: &[Category]) -> Self {
        let category_name = match post.category {
            Some(id) => categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Uncategorized".to_string()),
            None => String::new(),
        };
        let excerpt = excerpt(&strip_tags(&post.body), 200);
        Self {
            id: post.id,
            date: post.post_date.format("%Y-%m-%d").to_string(),
            title: post.title,
            body: post.body,
            excerpt,
            image: post.feature_image,
            published: post.published,
            category_id: post.category,
            category_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

impl CategoryLink {
    pub fn list(categories: &[Category], viewing: Option<i64>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                id: c.id,
                name: c.name.clone(),
                active: viewing == Some(c.id),
            })
            .collect()
    }
}

/// A `<select>` entry on the post form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: &[Category], selected: Option<i64>) -> Vec<Self> {
        categories
            .iter()
            .map(|c| Self {
                id: c.id,
                name: c.name.clone(),
                selected: selected == Some(c.id),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LoginEventView {
    pub date: String,
    pub user_agent: String,
}

impl From<&LoginEvent> for LoginEventView {
    fn from(event: &LoginEvent) -> Self {
        Self {
            date: event.date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            user_agent: event.user_agent.clone(),
        }
    }
}

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

/// Drop anything that looks like an HTML tag.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").into_owned()
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// `?error=` codes shown as a banner on listing pages.
pub fn error_banner(code: Option<&str>) -> Option<String> {
    match code? {
        "not-found" => Some("That record no longer exists".to_string()),
        "" => None,
        _ => Some("Something went wrong".to_string()),
    }
}
