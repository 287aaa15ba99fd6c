//! Friendship endpoints.

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use plaza_common::AppResult;
use serde::{Deserialize, Serialize};

use crate::{
    endpoints::users::UserResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Friend request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub id: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub accepted: bool,
    pub created_at: String,
}

impl From<plaza_db::entities::friend_request::Model> for FriendRequestResponse {
    fn from(r: plaza_db::entities::friend_request::Model) -> Self {
        Self {
            id: r.id,
            requester_id: r.requester_id,
            recipient_id: r.recipient_id,
            accepted: r.accepted,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Send request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestBody {
    pub user_id: String,
}

/// Send a friend request.
async fn send_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SendRequestBody>,
) -> AppResult<ApiResponse<FriendRequestResponse>> {
    let request = state
        .friendship_service
        .send_request(&user.id, &req.user_id)
        .await?;

    Ok(ApiResponse::ok(request.into()))
}

/// List pending requests received by the acting user.
async fn list_pending(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<FriendRequestResponse>>> {
    let requests = state.friendship_service.list_pending(&user.id).await?;

    Ok(ApiResponse::ok(
        requests.into_iter().map(FriendRequestResponse::from).collect(),
    ))
}

/// Accept a friend request.
async fn accept_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FriendRequestResponse>> {
    let request = state
        .friendship_service
        .accept_request(&user.id, &id)
        .await?;

    Ok(ApiResponse::ok(request.into()))
}

/// Reject a friend request.
async fn reject_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state
        .friendship_service
        .reject_request(&user.id, &id)
        .await?;
    Ok(crate::response::ok())
}

/// List the acting user's friends.
async fn list_friends(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let friends = state.friendship_service.list_friends(&user.id).await?;

    Ok(ApiResponse::ok(
        friends.into_iter().map(UserResponse::from).collect(),
    ))
}

/// Remove a friend. Both directions go away together.
async fn remove_friend(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(friend_id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state
        .friendship_service
        .remove_friend(&user.id, &friend_id)
        .await?;
    Ok(crate::response::ok())
}

/// Create the friendships router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", post(send_request).get(list_pending))
        .route("/requests/{id}/accept", post(accept_request))
        .route("/requests/{id}/reject", post(reject_request))
        .route("/", get(list_friends))
        .route("/{friend_id}", delete(remove_friend))
}
