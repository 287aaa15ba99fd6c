//! Friendship repository.
//!
//! Reads only. Writes happen inside the friendship service's
//! transactions so the two directed rows never diverge.

use std::sync::Arc;

use crate::entities::{Friendship, friendship};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Friendship repository for database operations.
#[derive(Clone)]
pub struct FriendshipRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendshipRepository {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the directed friendship row for a pair.
    pub async fn find_by_pair(
        &self,
        user_id: &str,
        friend_id: &str,
    ) -> AppResult<Option<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .filter(friendship::Column::FriendId.eq(friend_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether two users are friends.
    pub async fn are_friends(&self, user_id: &str, friend_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(user_id, friend_id).await?.is_some())
    }

    /// Get a user's friend rows, newest first.
    pub async fn find_friends(&self, user_id: &str) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .order_by_desc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's friends.
    pub async fn count_friends(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(friendship::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
