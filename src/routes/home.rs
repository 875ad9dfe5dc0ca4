use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::routes::view::Nav;

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index() -> Redirect {
    Redirect::to("/blog")
}

pub async fn about(nav: Nav) -> impl IntoResponse {
    Html(AboutTemplate { nav })
}

pub async fn not_found(nav: Nav) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(NotFoundTemplate { nav }))
}
