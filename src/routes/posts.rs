use askama::Template;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::blog::check_title;
use crate::cdn::ImageFile;
use crate::db::models::{ImageChange, NewPost, Post, PostChanges, PostFilter};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::routes::view::{error_banner, CategoryOption, Nav, PostView};
use crate::state::AppState;

/// Largest multipart body accepted on the post forms.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const NOT_FOUND_REDIRECT: &str = "/posts?error=not-found";

#[derive(Debug, Default, Deserialize)]
struct PostsQuery {
    category: Option<String>,
    #[serde(rename = "minDate")]
    min_date: Option<String>,
    error: Option<String>,
}

impl PostsQuery {
    fn filter(&self) -> PostFilter {
        if let Some(id) = self.category.as_deref().and_then(|c| c.trim().parse().ok()) {
            return PostFilter::Category(id);
        }
        let min_date = self
            .min_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
        match min_date {
            Some(date) => PostFilter::MinDate(date),
            None => PostFilter::All,
        }
    }
}

#[derive(Template)]
#[template(path = "pages/posts.html")]
struct PostsTemplate {
    nav: Nav,
    posts: Vec<PostView>,
    category_options: Vec<CategoryOption>,
    min_date: String,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/post_form.html")]
struct PostFormTemplate {
    nav: Nav,
    editing: bool,
    action: String,
    error: Option<String>,
    title: String,
    body: String,
    category_options: Vec<CategoryOption>,
    published: bool,
    image: Option<String>,
}

/// Fields of the add/edit post form.
#[derive(Debug, Default)]
struct PostForm {
    title: String,
    body: String,
    category: Option<i64>,
    published: bool,
    remove_image: bool,
    image_url: Option<String>,
    image_file: Option<ImageFile>,
}

impl PostForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = PostForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "featureImage" => {
                    let file_name = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data: Bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
                    if !data.is_empty() {
                        form.image_file = Some(ImageFile {
                            file_name,
                            content_type,
                            data,
                        });
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Malformed form: {e}")))?;
                    form.set_text(&name, value);
                }
            }
        }
        Ok(form)
    }

    fn set_text(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = value,
            "body" => self.body = value,
            "category" => self.category = value.trim().parse().ok(),
            "published" => self.published = true,
            "removeImage" => self.remove_image = true,
            "featureImageUrl" => {
                let url = value.trim();
                self.image_url = (!url.is_empty()).then(|| url.to_string());
            }
            _ => {}
        }
    }

    /// Form contents for re-rendering, without touching the CDN.
    fn draft(&self) -> NewPost {
        NewPost {
            title: self.title.clone(),
            body: self.body.clone(),
            feature_image: None,
            published: self.published,
            category: self.category,
        }
    }

    /// Upload the attached file, falling back to the pasted URL. A failed
    /// upload is logged and treated as no new image.
    async fn resolve_image(&mut self, state: &AppState) -> Option<String> {
        if let Some(file) = self.image_file.take() {
            match state.images.upload(file).await {
                Ok(url) => return Some(url.to_string()),
                Err(e) => tracing::warn!("Image upload failed, saving without it: {}", e),
            }
        }
        self.image_url.take()
    }

    async fn into_new_post(mut self, state: &AppState) -> NewPost {
        let feature_image = self.resolve_image(state).await;
        NewPost {
            title: self.title,
            body: self.body,
            feature_image,
            published: self.published,
            category: self.category,
        }
    }

    async fn into_changes(mut self, state: &AppState) -> PostChanges {
        let image = if self.remove_image {
            ImageChange::Remove
        } else {
            match self.resolve_image(state).await {
                Some(url) => ImageChange::Replace(url),
                None => ImageChange::Keep,
            }
        };
        PostChanges {
            title: self.title,
            body: self.body,
            published: self.published,
            category: self.category,
            image,
        }
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

async fn list_posts(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Query(query): Query<PostsQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = query.filter();
    let posts = state.blog.posts(filter).await?;
    let categories = state.blog.categories().await?;

    let selected = match filter {
        PostFilter::Category(id) => Some(id),
        _ => None,
    };
    let message = posts.is_empty().then(|| "No results".to_string());

    Ok(Html(PostsTemplate {
        nav,
        category_options: CategoryOption::list(&categories, selected),
        posts: posts
            .into_iter()
            .map(|p| PostView::new(p, &categories))
            .collect(),
        min_date: query.min_date.clone().unwrap_or_default(),
        message,
        error: error_banner(query.error.as_deref()),
    }))
}

async fn render_form(
    state: &AppState,
    nav: Nav,
    post: Option<&Post>,
    draft: Option<(&NewPost, String)>,
) -> AppResult<Response> {
    let categories = state.blog.categories().await?;
    let action = match post {
        Some(p) => format!("/posts/{}", p.id),
        None => "/posts/add".to_string(),
    };

    let template = match (draft, post) {
        (Some((draft, error)), _) => PostFormTemplate {
            nav,
            editing: post.is_some(),
            action,
            error: Some(error),
            title: draft.title.clone(),
            body: draft.body.clone(),
            category_options: CategoryOption::list(&categories, draft.category),
            published: draft.published,
            image: post.and_then(|p| p.feature_image.clone()),
        },
        (None, Some(post)) => PostFormTemplate {
            nav,
            editing: true,
            action,
            error: None,
            title: post.title.clone(),
            body: post.body.clone(),
            category_options: CategoryOption::list(&categories, post.category),
            published: post.published,
            image: post.feature_image.clone(),
        },
        (None, None) => PostFormTemplate {
            nav,
            editing: false,
            action,
            error: None,
            title: String::new(),
            body: String::new(),
            category_options: CategoryOption::list(&categories, None),
            published: false,
            image: None,
        },
    };
    Ok(Html(template).into_response())
}

async fn add_page(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
) -> AppResult<Response> {
    render_form(&state, nav, None, None).await
}

async fn add_post(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = PostForm::read(multipart).await?;
    if let Err(AppError::Validation(msg)) = check_title(&form.title) {
        let draft = form.draft();
        return render_form(&state, nav, None, Some((&draft, msg))).await;
    }
    let new_post = form.into_new_post(&state).await;
    state.blog.create_post(new_post).await?;
    Ok(Redirect::to("/posts").into_response())
}

async fn edit_page(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(NOT_FOUND_REDIRECT).into_response());
    };
    match state.blog.post(id).await {
        Ok(post) => render_form(&state, nav, Some(&post), None).await,
        Err(AppError::NotFound(_)) => Ok(Redirect::to(NOT_FOUND_REDIRECT).into_response()),
        Err(e) => Err(e),
    }
}

async fn update_post(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(NOT_FOUND_REDIRECT).into_response());
    };
    let form = PostForm::read(multipart).await?;
    if let Err(AppError::Validation(msg)) = check_title(&form.title) {
        return match state.blog.post(id).await {
            Ok(current) => {
                let draft = form.draft();
                render_form(&state, nav, Some(&current), Some((&draft, msg))).await
            }
            Err(AppError::NotFound(_)) => Ok(Redirect::to(NOT_FOUND_REDIRECT).into_response()),
            Err(e) => Err(e),
        };
    }
    let changes = form.into_changes(&state).await;

    match state.blog.update_post(id, changes).await {
        Ok(_) => Ok(Redirect::to("/posts").into_response()),
        Err(AppError::NotFound(_)) => Ok(Redirect::to(NOT_FOUND_REDIRECT).into_response()),
        Err(e) => Err(e),
    }
}

async fn delete_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Some(id) = parse_id(&id) else {
        return Redirect::to(NOT_FOUND_REDIRECT).into_response();
    };
    match state.blog.delete_post(id).await {
        Ok(()) => Redirect::to("/posts").into_response(),
        Err(AppError::NotFound(_)) => Redirect::to(NOT_FOUND_REDIRECT).into_response(),
        Err(e) => {
            tracing::error!(id, "Delete failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to Remove Post / Post not found",
            )
                .into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/add", get(add_page).post(add_post))
        .route("/posts/{id}", get(edit_page).post(update_post))
        .route("/posts/delete/{id}", get(delete_post))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_filter_wins_over_date() {
        let query = PostsQuery {
            category: Some("3".into()),
            min_date: Some("2024-01-01".into()),
            error: None,
        };
        assert_eq!(query.filter(), PostFilter::Category(3));
    }

    #[test]
    fn min_date_starts_at_midnight_utc() {
        let query = PostsQuery {
            min_date: Some("2024-02-29".into()),
            ..Default::default()
        };
        match query.filter() {
            PostFilter::MinDate(date) => assert_eq!(date.to_rfc3339(), "2024-02-29T00:00:00+00:00"),
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn unusable_filters_fall_back_to_all() {
        let query = PostsQuery {
            category: Some("news".into()),
            min_date: Some("yesterday".into()),
            error: None,
        };
        assert_eq!(query.filter(), PostFilter::All);
    }

    #[test]
    fn empty_text_fields_map_to_none() {
        let mut form = PostForm::default();
        form.set_text("category", String::new());
        form.set_text("featureImageUrl", "  ".into());
        assert_eq!(form.category, None);
        assert_eq!(form.image_url, None);

        form.set_text("category", "7".into());
        form.set_text("published", "on".into());
        assert_eq!(form.category, Some(7));
        assert!(form.published);
    }
}
