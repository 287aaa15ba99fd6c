//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use plaza_core::{
    CommentService, FriendshipService, GroupService, MediaService, PostService, ProfileService,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub profile_service: ProfileService,
    pub friendship_service: FriendshipService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub group_service: GroupService,
    pub media_service: MediaService,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to a user model and stores it in request
/// extensions for the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(_) => {
                // Bad tokens fall through as anonymous; protected
                // routes reject via the AuthUser extractor.
                tracing::debug!("bearer token did not resolve to a user");
            }
        }
    }

    next.run(req).await
}
