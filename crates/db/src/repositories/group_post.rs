//! Group post and group comment repository.

use std::sync::Arc;

use crate::entities::{GroupComment, GroupPost, group_comment, group_post};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Group post repository for database operations.
#[derive(Clone)]
pub struct GroupPostRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupPostRepository {
    /// Create a new group post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<group_post::Model>> {
        GroupPost::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a group post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<group_post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new group post.
    pub async fn create(&self, model: group_post::ActiveModel) -> AppResult<group_post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group post. Its comments cascade at the database level.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if let Some(post) = self.find_by_id(id).await? {
            post.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// List a group's posts newest-first (paginated).
    pub async fn list_by_group(
        &self,
        group_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<group_post::Model>> {
        GroupPost::find()
            .filter(group_post::Column::GroupId.eq(group_id))
            .order_by_desc(group_post::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group comment by ID.
    pub async fn find_comment_by_id(&self, id: &str) -> AppResult<Option<group_comment::Model>> {
        GroupComment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new group comment.
    pub async fn create_comment(
        &self,
        model: group_comment::ActiveModel,
    ) -> AppResult<group_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group comment.
    pub async fn delete_comment(&self, id: &str) -> AppResult<()> {
        if let Some(comment) = self.find_comment_by_id(id).await? {
            comment
                .delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// List a group post's comments in conversation order (oldest first).
    pub async fn list_comments(&self, group_post_id: &str) -> AppResult<Vec<group_comment::Model>> {
        GroupComment::find()
            .filter(group_comment::Column::GroupPostId.eq(group_post_id))
            .order_by_asc(group_comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
