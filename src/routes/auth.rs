use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::Utc;

use crate::auth::{Credentials, Registration, SessionUser};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::routes::view::{LoginEventView, Nav};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginTemplate {
    nav: Nav,
    user_name: String,
    error_message: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
struct RegisterTemplate {
    nav: Nav,
    user_name: String,
    error_message: Option<String>,
    success_message: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/login_history.html")]
struct LoginHistoryTemplate {
    nav: Nav,
    user_name: String,
    email: String,
    events: Vec<LoginEventView>,
}

/// Errors a visitor can fix by retyping the form.
fn form_message(err: AppError) -> AppResult<String> {
    match err {
        AppError::Validation(_) | AppError::Conflict(_) | AppError::NotFound(_) | AppError::Auth(_) => {
            Ok(err.user_message())
        }
        other => Err(other),
    }
}

async fn login_page(nav: Nav) -> impl IntoResponse {
    Html(LoginTemplate {
        nav,
        user_name: String::new(),
        error_message: None,
    })
}

async fn login(
    State(state): State<AppState>,
    nav: Nav,
    headers: HeaderMap,
    Form(credentials): Form<Credentials>,
) -> AppResult<Response> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let user_name = credentials.user_name.clone();

    match state.auth.login(credentials, user_agent).await {
        Ok(user) => {
            let now = Utc::now();
            let session = state.sessions.start(
                SessionUser {
                    user_name: user.user_name,
                    email: user.email,
                },
                now,
            );
            let cookie = state
                .sessions
                .set_cookie(&session, now)
                .map_err(|e| AppError::Internal(format!("session encoding failed: {e}")))?;
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/blog")).into_response())
        }
        Err(e) => {
            let message = form_message(e)?;
            Ok(Html(LoginTemplate {
                nav,
                user_name,
                error_message: Some(message),
            })
            .into_response())
        }
    }
}

async fn register_page(nav: Nav) -> impl IntoResponse {
    Html(RegisterTemplate {
        nav,
        user_name: String::new(),
        error_message: None,
        success_message: None,
    })
}

async fn register(
    State(state): State<AppState>,
    nav: Nav,
    Form(candidate): Form<Registration>,
) -> AppResult<impl IntoResponse> {
    let user_name = candidate.user_name.clone();
    let (error_message, success_message) = match state.auth.register(candidate).await {
        Ok(_) => (None, Some("User created".to_string())),
        Err(e) => (Some(form_message(e)?), None),
    };
    Ok(Html(RegisterTemplate {
        nav,
        user_name,
        error_message,
        success_message,
    }))
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Redirect::to("/"),
    )
}

async fn login_history(
    State(state): State<AppState>,
    nav: Nav,
    CurrentUser(current): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let user = state.auth.get_user(&current.user_name).await?;
    Ok(Html(LoginHistoryTemplate {
        nav,
        events: user.login_history.iter().map(LoginEventView::from).collect(),
        user_name: user.user_name,
        email: user.email,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
        .route("/loginHistory", get(login_history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;

    #[test]
    fn fixable_errors_become_form_messages() {
        let msg = form_message(AppError::Conflict("User Name already taken".into())).unwrap();
        assert_eq!(msg, "User Name already taken");
        assert!(form_message(AppError::Auth("nope".into())).is_ok());
    }

    #[test]
    fn store_errors_propagate() {
        let err = form_message(AppError::Store(StoreError::StaleWrite("a".into())));
        assert!(matches!(err, Err(AppError::Store(_))));
    }
}
