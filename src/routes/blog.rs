use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::blog::{parse_page, Page};
use crate::db::models::{Category, Post};
use crate::error::{AppError, AppResult};
use crate::routes::home::Html;
use crate::routes::view::{CategoryLink, Nav, PostView};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BlogQuery {
    category: Option<String>,
    page: Option<String>,
}

impl BlogQuery {
    fn category(&self) -> Option<i64> {
        self.category.as_deref().and_then(|c| c.trim().parse().ok())
    }

    fn page(&self) -> usize {
        parse_page(self.page.as_deref())
    }
}

#[derive(Template)]
#[template(path = "pages/blog.html")]
struct BlogTemplate {
    nav: Nav,
    featured: Option<PostView>,
    message: Option<String>,
    page: Page<PostView>,
    total_pages: usize,
    prev_href: Option<String>,
    next_href: Option<String>,
    categories: Vec<CategoryLink>,
    viewing_category: Option<i64>,
}

fn page_href(category: Option<i64>, page: usize) -> String {
    match category {
        Some(id) => format!("/blog?category={id}&page={page}"),
        None => format!("/blog?page={page}"),
    }
}

impl BlogTemplate {
    fn build(
        nav: Nav,
        featured: Option<Post>,
        posts: Vec<Post>,
        categories: Vec<Category>,
        query: &BlogQuery,
        page_size: usize,
    ) -> Self {
        let viewing = query.category();
        let message = (featured.is_none() && posts.is_empty()).then(|| "No results".to_string());
        let featured = featured.map(|p| PostView::new(p, &categories));
        let page = Page::slice(posts, query.page(), page_size)
            .map(|p| PostView::new(p, &categories));

        Self {
            nav,
            featured,
            message,
            total_pages: page.total_pages(),
            prev_href: page.has_prev().then(|| page_href(viewing, page.number - 1)),
            next_href: page.has_next().then(|| page_href(viewing, page.number + 1)),
            page,
            categories: CategoryLink::list(&categories, viewing),
            viewing_category: viewing,
        }
    }
}

/// Published posts, newest first. The newest one is featured above the list.
async fn blog(
    State(state): State<AppState>,
    nav: Nav,
    Query(query): Query<BlogQuery>,
) -> AppResult<impl IntoResponse> {
    let posts = state.blog.published_posts(query.category()).await?;
    let categories = state.blog.categories().await?;
    let featured = posts.first().cloned();

    Ok(Html(BlogTemplate::build(
        nav,
        featured,
        posts,
        categories,
        &query,
        state.config.blog.page_size,
    )))
}

async fn blog_post(
    State(state): State<AppState>,
    nav: Nav,
    Path(id): Path<String>,
    Query(query): Query<BlogQuery>,
) -> AppResult<impl IntoResponse> {
    let featured = match id.parse::<i64>() {
        Ok(id) => match state.blog.published_post(id).await {
            Ok(post) => Some(post),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        },
        Err(_) => None,
    };
    let posts = state.blog.published_posts(query.category()).await?;
    let categories = state.blog.categories().await?;

    let mut template = BlogTemplate::build(
        nav,
        featured,
        posts,
        categories,
        &query,
        state.config.blog.page_size,
    );
    if template.featured.is_none() {
        template.message = Some("No results".to_string());
    }
    Ok(Html(template))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(blog))
        .route("/blog/{id}", get(blog_post))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_query_parsing() {
        let query = BlogQuery {
            category: Some("abc".into()),
            page: Some("-2".into()),
        };
        assert_eq!(query.category(), None);
        assert_eq!(query.page(), 1);

        let query = BlogQuery {
            category: Some(" 4 ".into()),
            page: Some("3".into()),
        };
        assert_eq!(query.category(), Some(4));
        assert_eq!(query.page(), 3);
    }

    #[test]
    fn page_links_keep_the_category() {
        assert_eq!(page_href(Some(2), 3), "/blog?category=2&page=3");
        assert_eq!(page_href(None, 1), "/blog?page=1");
    }
}
