//! Profile service.

use plaza_common::{AppError, AppResult};
use plaza_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Profile service for the public-facing part of an account.
#[derive(Clone)]
pub struct ProfileService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
}

/// Input for updating a profile.
///
/// `avatar_url` and `cover_url` are set by the API layer after the
/// uploaded images have passed validation and landed in storage.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 2048))]
    pub bio: Option<String>,

    pub avatar_url: Option<String>,

    pub cover_url: Option<String>,
}

impl ProfileService {
    /// Create a new profile service.
    #[must_use]
    pub fn new(user_repo: UserRepository, profile_repo: UserProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
        }
    }

    /// Get a profile together with the account it belongs to.
    pub async fn get(&self, user_id: &str) -> AppResult<(user::Model, user_profile::Model)> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        Ok((user, profile))
    }

    /// Update the acting user's own profile.
    pub async fn update(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user_profile::Model> {
        input.validate()?;

        let profile = self.profile_repo.get_by_user_id(user_id).await?;
        let mut active: user_profile::ActiveModel = profile.into();

        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(cover_url) = input.cover_url {
            active.cover_url = Set(Some(cover_url));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.profile_repo.update(active).await
    }
}
