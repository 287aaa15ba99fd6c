//! Group endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use plaza_common::{AppError, AppResult};
use plaza_core::UploadKind;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Group response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub creator_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<plaza_db::entities::group::Model> for GroupResponse {
    fn from(g: plaza_db::entities::group::Model) -> Self {
        Self {
            id: g.id,
            creator_id: g.creator_id,
            name: g.name,
            description: g.description,
            created_at: g.created_at.to_rfc3339(),
        }
    }
}

/// Group member response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberResponse {
    pub user_id: String,
    pub joined_at: String,
}

impl From<plaza_db::entities::group_member::Model> for GroupMemberResponse {
    fn from(m: plaza_db::entities::group_member::Model) -> Self {
        Self {
            user_id: m.user_id,
            joined_at: m.created_at.to_rfc3339(),
        }
    }
}

/// Group post response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPostResponse {
    pub id: String,
    pub group_id: String,
    pub author_id: String,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

impl From<plaza_db::entities::group_post::Model> for GroupPostResponse {
    fn from(p: plaza_db::entities::group_post::Model) -> Self {
        Self {
            id: p.id,
            group_id: p.group_id,
            author_id: p.author_id,
            body: p.body,
            image_url: p.image_url,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Group comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCommentResponse {
    pub id: String,
    pub group_post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<plaza_db::entities::group_comment::Model> for GroupCommentResponse {
    fn from(c: plaza_db::entities::group_comment::Model) -> Self {
        Self {
            id: c.id,
            group_post_id: c.group_post_id,
            author_id: c.author_id,
            body: c.body,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Group creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Create a group. The creator becomes a member immediately.
async fn create_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let input = plaza_core::group::CreateGroupInput {
        name: req.name,
        description: req.description,
    };

    let group = state.group_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(group.into()))
}

/// List params.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    30
}

/// List groups the acting user belongs to.
async fn list_groups(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<Vec<GroupResponse>>> {
    let limit = params.limit.min(100);
    let groups = state
        .group_service
        .list_joined(&user.id, limit, params.offset)
        .await?;

    Ok(ApiResponse::ok(
        groups.into_iter().map(GroupResponse::from).collect(),
    ))
}

/// Group with members response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub members: Vec<GroupMemberResponse>,
}

/// Get a group with its member list.
async fn get_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<GroupDetailResponse>> {
    let group = state.group_service.get(&id).await?;
    let members = state.group_service.list_members(&user.id, &id).await?;

    Ok(ApiResponse::ok(GroupDetailResponse {
        group: group.into(),
        members: members.into_iter().map(GroupMemberResponse::from).collect(),
    }))
}

/// Member addition request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersRequest {
    pub user_ids: Vec<String>,
}

/// Member addition response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersResponse {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
}

/// Add members as a batch. Members only; already-present IDs are skipped.
async fn add_members(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddMembersRequest>,
) -> AppResult<ApiResponse<AddMembersResponse>> {
    let result = state
        .group_service
        .add_members(&user.id, &id, req.user_ids)
        .await?;

    Ok(ApiResponse::ok(AddMembersResponse {
        added: result.added,
        skipped: result.skipped,
    }))
}

/// Post inside a group.
///
/// Multipart fields: `body` (text), `image` (JPEG or PNG, up to 8 MiB).
async fn create_group_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<GroupPostResponse>> {
    let mut body: Option<String> = None;
    let mut image_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "body" => {
                body = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                let stored = state
                    .media_service
                    .store(UploadKind::GroupPost, &user.id, &file_name, &data)
                    .await?;
                image_url = Some(stored.url);
            }
            _ => {}
        }
    }

    let input = plaza_core::group::CreateGroupPostInput {
        body: body.ok_or_else(|| AppError::BadRequest("No body provided".to_string()))?,
        image_url,
    };

    let created = state.group_service.create_post(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(created.into()))
}

/// List a group's posts, newest first. Members only.
async fn list_group_posts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<Vec<GroupPostResponse>>> {
    let limit = params.limit.min(100);
    let posts = state
        .group_service
        .list_posts(&user.id, &id, limit, params.offset)
        .await?;

    Ok(ApiResponse::ok(
        posts.into_iter().map(GroupPostResponse::from).collect(),
    ))
}

/// Group comment creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupCommentRequest {
    pub body: String,
}

/// Comment on a group post. Members only.
async fn create_group_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((_id, post_id)): Path<(String, String)>,
    Json(req): Json<CreateGroupCommentRequest>,
) -> AppResult<ApiResponse<GroupCommentResponse>> {
    let input = plaza_core::group::CreateGroupCommentInput { body: req.body };

    let comment = state
        .group_service
        .add_comment(&user.id, &post_id, input)
        .await?;

    Ok(ApiResponse::ok(comment.into()))
}

/// List a group post's comments in conversation order. Members only.
async fn list_group_comments(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((_id, post_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Vec<GroupCommentResponse>>> {
    let comments = state.group_service.list_comments(&user.id, &post_id).await?;

    Ok(ApiResponse::ok(
        comments
            .into_iter()
            .map(GroupCommentResponse::from)
            .collect(),
    ))
}

/// Delete a group comment. Author only.
async fn delete_group_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.group_service.delete_comment(&user.id, &id).await?;
    Ok(crate::response::ok())
}

/// Create the groups router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group).get(list_groups))
        .route("/{id}", get(get_group))
        .route("/{id}/members", post(add_members))
        .route("/{id}/posts", post(create_group_post).get(list_group_posts))
        .route(
            "/{id}/posts/{post_id}/comments",
            post(create_group_comment).get(list_group_comments),
        )
        .route("/comments/{id}", delete(delete_group_comment))
}
