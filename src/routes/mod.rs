pub mod assets;
pub mod auth;
pub mod blog;
pub mod categories;
pub mod home;
pub mod posts;
pub mod view;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::session::session_layer;
use crate::state::AppState;

/// The full application router with session decoding and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/about", get(home::about))
        .route("/assets/{*path}", get(assets::serve))
        .merge(blog::router())
        .merge(auth::router())
        .merge(posts::router())
        .merge(categories::router())
        .fallback(home::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), session_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
