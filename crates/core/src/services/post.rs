//! Post service.

use plaza_common::{AppError, AppResult, IdGenerator};
use plaza_db::{
    entities::{post, post_like},
    repositories::{PostLikeRepository, PostRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Post service for the public feed.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    like_repo: PostLikeRepository,
    id_gen: IdGenerator,
}

/// Input for creating a post.
///
/// `image_url` is set by the API layer after the upload has passed
/// image validation and landed in storage.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 8192))]
    pub body: String,

    pub image_url: Option<String>,

    #[validate(url)]
    pub map_url: Option<String>,
}

/// Input for updating a post.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 8192))]
    pub body: Option<String>,

    pub image_url: Option<String>,

    #[validate(url)]
    pub map_url: Option<String>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeToggle {
    /// Whether the acting user likes the post after the toggle.
    pub liked: bool,
    /// The post's like count after the toggle.
    pub count: u64,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(post_repo: PostRepository, like_repo: PostLikeRepository) -> Self {
        Self {
            post_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            body: Set(input.body),
            image_url: Set(input.image_url),
            map_url: Set(input.map_url),
            ..Default::default()
        };

        self.post_repo.create(model).await
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// List posts, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<post::Model>> {
        self.post_repo.list(limit, offset).await
    }

    /// List a user's posts, newest first.
    pub async fn list_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<post::Model>> {
        self.post_repo.list_by_author(author_id, limit, offset).await
    }

    /// Update a post. Only the author may edit.
    pub async fn update(
        &self,
        acting_user_id: &str,
        post_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != acting_user_id {
            return Err(AppError::Forbidden(
                "You can only edit your own posts".to_string(),
            ));
        }

        let mut active: post::ActiveModel = post.into();
        if let Some(body) = input.body {
            active.body = Set(body);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(map_url) = input.map_url {
            active.map_url = Set(Some(map_url));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.post_repo.update(active).await
    }

    /// Delete a post. Only the author may delete.
    ///
    /// Comments and likes go with the row via FK cascade.
    pub async fn delete(&self, acting_user_id: &str, post_id: &str) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != acting_user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.post_repo.delete(post_id).await
    }

    /// Toggle a like on a post.
    ///
    /// A pure toggle: liking a liked post unlikes it. Toggling twice is
    /// the identity. Returns the acting user's state and the post's like
    /// count after the toggle.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> AppResult<LikeToggle> {
        self.post_repo.get_by_id(post_id).await?;

        let liked = if self.like_repo.has_liked(post_id, user_id).await? {
            self.like_repo.delete_by_pair(post_id, user_id).await?;
            false
        } else {
            let model = post_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post_id.to_string()),
                user_id: Set(user_id.to_string()),
                ..Default::default()
            };
            match self.like_repo.create(model).await {
                Ok(_) => {}
                // A concurrent toggle can insert first; the unique index on
                // (post_id, user_id) rejects ours, but the post is liked
                // either way.
                Err(AppError::Database(message)) if message.contains("duplicate key") => {}
                Err(e) => return Err(e),
            }
            true
        };

        let count = self.like_repo.count_by_post(post_id).await?;

        Ok(LikeToggle { liked, count })
    }
}
