//! Users endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use plaza_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
    pub created_at: String,
}

impl From<plaza_db::entities::user::Model> for UserResponse {
    fn from(u: plaza_db::entities::user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            is_staff: u.is_staff,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Profile response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub friend_count: u64,
}

/// List params.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    30
}

/// List accounts, newest first.
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let limit = params.limit.min(100);
    let users = state.user_service.list(limit, params.offset).await?;

    Ok(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// Get an account by ID.
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Account update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub password: Option<String>,
}

/// Update an account. Owner only.
async fn update_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    if user.id != id {
        return Err(AppError::Forbidden(
            "You can only update your own account".to_string(),
        ));
    }

    let input = plaza_core::user::UpdateUserInput {
        email: req.email,
        username: req.username,
        display_name: req.display_name,
        password: req.password,
    };

    let updated = state.user_service.update(&id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Delete an account. Owner or staff.
async fn delete_user(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.user_service.delete(&user, &id).await?;
    Ok(crate::response::ok())
}

/// Get a user's profile.
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let (user, profile) = state.profile_service.get(&id).await?;
    let friend_count = state.friendship_service.count_friends(&id).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: user.into(),
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        cover_url: profile.cover_url,
        friend_count,
    }))
}

/// Create the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/{id}/profile", get(get_profile))
}
