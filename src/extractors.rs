use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use std::convert::Infallible;

use crate::auth::{Session, SessionUser};
use crate::routes::view::Nav;
use crate::state::AppState;

/// The signed-in user. Anonymous requests are redirected to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // populated by the session layer
        parts
            .extensions
            .get::<Session>()
            .map(|session| CurrentUser(session.user.clone()))
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Optional user extractor — `None` for anonymous requests.
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts.extensions.get::<Session>().map(|s| s.user.clone()),
        ))
    }
}

impl FromRequestParts<AppState> for Nav {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        Ok(Nav::for_path(parts.uri.path(), user))
    }
}
