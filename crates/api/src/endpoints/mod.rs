//! API endpoints.

mod auth;
mod comments;
mod friendships;
mod groups;
mod posts;
mod profiles;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .merge(profiles::router())
        .nest("/friendships", friendships::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/groups", groups::router())
}
