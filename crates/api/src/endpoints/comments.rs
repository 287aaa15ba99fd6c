//! Comment endpoints.

use axum::{
    extract::{Path, State},
    routing::patch,
    Json, Router,
};
use plaza_common::AppResult;
use serde::Deserialize;

use crate::{
    endpoints::posts::CommentResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Comment update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub body: String,
}

/// Update a comment. Author only.
async fn update_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let input = plaza_core::comment::UpdateCommentInput { body: req.body };

    let comment = state.comment_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Delete a comment. Author only.
async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.comment_service.delete(&user.id, &id).await?;
    Ok(crate::response::ok())
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", patch(update_comment).delete(delete_comment))
}
