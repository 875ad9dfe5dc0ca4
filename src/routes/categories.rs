use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::Category;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::routes::view::{error_banner, Nav};
use crate::state::AppState;

const NOT_FOUND_REDIRECT: &str = "/categories?error=not-found";

#[derive(Debug, Default, Deserialize)]
struct CategoriesQuery {
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryForm {
    #[serde(default)]
    category: String,
}

#[derive(Template)]
#[template(path = "pages/categories.html")]
struct CategoriesTemplate {
    nav: Nav,
    categories: Vec<Category>,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/category_form.html")]
struct CategoryFormTemplate {
    nav: Nav,
    editing: bool,
    action: String,
    name: String,
    error: Option<String>,
}

impl CategoryFormTemplate {
    fn add(nav: Nav, name: String, error: Option<String>) -> Self {
        Self {
            nav,
            editing: false,
            action: "/categories/add".to_string(),
            name,
            error,
        }
    }

    fn edit(nav: Nav, id: i64, name: String, error: Option<String>) -> Self {
        Self {
            nav,
            editing: true,
            action: format!("/categories/{id}"),
            name,
            error,
        }
    }
}

fn not_found() -> Response {
    Redirect::to(NOT_FOUND_REDIRECT).into_response()
}

async fn list_categories(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Query(query): Query<CategoriesQuery>,
) -> AppResult<impl IntoResponse> {
    Ok(Html(CategoriesTemplate {
        nav,
        categories: state.blog.categories().await?,
        error: error_banner(query.error.as_deref()),
    }))
}

async fn add_page(nav: Nav, _user: CurrentUser) -> impl IntoResponse {
    Html(CategoryFormTemplate::add(nav, String::new(), None))
}

async fn add_category(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Form(form): Form<CategoryForm>,
) -> AppResult<Response> {
    match state.blog.create_category(&form.category).await {
        Ok(_) => Ok(Redirect::to("/categories").into_response()),
        Err(AppError::Validation(msg)) => {
            Ok(Html(CategoryFormTemplate::add(nav, form.category, Some(msg))).into_response())
        }
        Err(e) => Err(e),
    }
}

async fn edit_page(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let Ok(id) = id.trim().parse::<i64>() else {
        return Ok(not_found());
    };
    match state.blog.category(id).await {
        Ok(category) => {
            Ok(Html(CategoryFormTemplate::edit(nav, id, category.name, None)).into_response())
        }
        Err(AppError::NotFound(_)) => Ok(not_found()),
        Err(e) => Err(e),
    }
}

async fn rename_category(
    State(state): State<AppState>,
    nav: Nav,
    _user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> AppResult<Response> {
    let Ok(id) = id.trim().parse::<i64>() else {
        return Ok(not_found());
    };
    match state.blog.rename_category(id, &form.category).await {
        Ok(_) => Ok(Redirect::to("/categories").into_response()),
        Err(AppError::NotFound(_)) => Ok(not_found()),
        Err(AppError::Validation(msg)) => Ok(Html(CategoryFormTemplate::edit(
            nav,
            id,
            form.category,
            Some(msg),
        ))
        .into_response()),
        Err(e) => Err(e),
    }
}

async fn delete_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.trim().parse::<i64>() else {
        return not_found();
    };
    match state.blog.delete_category(id).await {
        Ok(()) => Redirect::to("/categories").into_response(),
        Err(AppError::NotFound(_)) => not_found(),
        Err(e) => {
            tracing::error!(id, "Delete failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to Remove Category / Category not found",
            )
                .into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/add", get(add_page).post(add_category))
        .route("/categories/{id}", get(edit_page).post(rename_category))
        .route("/categories/delete/{id}", get(delete_category))
}
