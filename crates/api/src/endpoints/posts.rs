//! Post endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use plaza_common::{AppError, AppResult};
use plaza_core::UploadKind;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Post response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub body: String,
    pub image_url: Option<String>,
    pub map_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<plaza_db::entities::post::Model> for PostResponse {
    fn from(p: plaza_db::entities::post::Model) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            body: p.body,
            image_url: p.image_url,
            map_url: p.map_url,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<plaza_db::entities::comment::Model> for CommentResponse {
    fn from(c: plaza_db::entities::comment::Model) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author_id: c.author_id,
            body: c.body,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Create a post.
///
/// Multipart fields: `body` (text), `mapUrl` (text), `image` (JPEG or
/// PNG, up to 8 MiB).
async fn create_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<PostResponse>> {
    let mut body: Option<String> = None;
    let mut map_url: Option<String> = None;
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
            "mapUrl" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.is_empty() {
                    map_url = Some(text);
                }
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                let stored = state
                    .media_service
                    .store(UploadKind::Post, &user.id, &file_name, &data)
                    .await?;
                image_url = Some(stored.url);
            }
            _ => {}
        }
    }

    let input = plaza_core::post::CreatePostInput {
        body: body.ok_or_else(|| AppError::BadRequest("No body provided".to_string()))?,
        image_url,
        map_url,
    };

    let created = state.post_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(created.into()))
}

/// List params.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsParams {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    pub author_id: Option<String>,
}

const fn default_limit() -> u64 {
    30
}

/// List posts, newest first. Optionally filtered by author.
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let limit = params.limit.min(100);

    let posts = match &params.author_id {
        Some(author_id) => {
            state
                .post_service
                .list_by_author(author_id, limit, params.offset)
                .await?
        }
        None => state.post_service.list(limit, params.offset).await?,
    };

    Ok(ApiResponse::ok(
        posts.into_iter().map(PostResponse::from).collect(),
    ))
}

/// Get a post by ID.
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&id).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Post update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub body: Option<String>,
    pub map_url: Option<String>,
}

/// Update a post. Author only.
async fn update_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let input = plaza_core::post::UpdatePostInput {
        body: req.body,
        image_url: None,
        map_url: req.map_url,
    };

    let updated = state.post_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Delete a post. Author only.
async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.post_service.delete(&user.id, &id).await?;
    Ok(crate::response::ok())
}

/// Like toggle response. Returned bare, not wrapped in `ApiResponse`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub count: u64,
}

/// Toggle a like on a post.
async fn toggle_like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LikeResponse>> {
    let result = state.post_service.toggle_like(&user.id, &id).await?;

    Ok(Json(LikeResponse {
        liked: result.liked,
        count: result.count,
    }))
}

/// Comment creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub body: String,
}

/// Comment on a post.
async fn create_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let input = plaza_core::comment::CreateCommentInput { body: req.body };

    let comment = state.comment_service.create(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// List a post's comments in conversation order.
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.comment_service.list_by_post(&id).await?;

    Ok(ApiResponse::ok(
        comments.into_iter().map(CommentResponse::from).collect(),
    ))
}

/// Create the posts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post).get(list_posts))
        .route(
            "/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comments", post(create_comment).get(list_comments))
}
