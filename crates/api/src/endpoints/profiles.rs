//! Profile endpoints.

use axum::{
    extract::{Multipart, State},
    routing::patch,
    Router,
};
use plaza_common::{AppError, AppResult};
use plaza_core::UploadKind;

use crate::{
    endpoints::users::ProfileResponse, extractors::AuthUser, middleware::AppState,
    response::ApiResponse,
};

/// Update the acting user's profile.
///
/// Multipart fields: `bio` (text), `avatar` (image), `cover` (image).
/// Images go through format sniffing and size checks before anything
/// lands in storage.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ProfileResponse>> {
    let mut bio: Option<String> = None;
    let mut avatar_url: Option<String> = None;
    let mut cover_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "bio" => {
                bio = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "avatar" => {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                let stored = state
                    .media_service
                    .store(UploadKind::Avatar, &user.id, &file_name, &data)
                    .await?;
                avatar_url = Some(stored.url);
            }
            "cover" => {
                let file_name = field.file_name().unwrap_or("cover").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                let stored = state
                    .media_service
                    .store(UploadKind::Cover, &user.id, &file_name, &data)
                    .await?;
                cover_url = Some(stored.url);
            }
            _ => {}
        }
    }

    let input = plaza_core::profile::UpdateProfileInput {
        bio,
        avatar_url,
        cover_url,
    };

    let profile = state.profile_service.update(&user.id, input).await?;
    let friend_count = state.friendship_service.count_friends(&user.id).await?;

    Ok(ApiResponse::ok(ProfileResponse {
        user: user.into(),
        bio: profile.bio,
        avatar_url: profile.avatar_url,
        cover_url: profile.cover_url,
        friend_count,
    }))
}

/// Create the profile router.
pub fn router() -> Router<AppState> {
    Router::new().route("/profile", patch(update_profile))
}
