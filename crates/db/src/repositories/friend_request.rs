//! Friend request repository.

use std::sync::Arc;

use crate::entities::{FriendRequest, friend_request};
use plaza_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

/// Friend request repository for database operations.
#[derive(Clone)]
pub struct FriendRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendRequestRepository {
    /// Create a new friend request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a friend request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<friend_request::Model>> {
        FriendRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a request by requester and recipient.
    pub async fn find_by_pair(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> AppResult<Option<friend_request::Model>> {
        FriendRequest::find()
            .filter(friend_request::Column::RequesterId.eq(requester_id))
            .filter(friend_request::Column::RecipientId.eq(recipient_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a pending (not yet accepted) request for the ordered pair.
    pub async fn find_pending_by_pair(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> AppResult<Option<friend_request::Model>> {
        FriendRequest::find()
            .filter(friend_request::Column::RequesterId.eq(requester_id))
            .filter(friend_request::Column::RecipientId.eq(recipient_id))
            .filter(friend_request::Column::Accepted.eq(false))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new friend request.
    pub async fn create(
        &self,
        model: friend_request::ActiveModel,
    ) -> AppResult<friend_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a friend request.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let request = self.find_by_id(id).await?;
        if let Some(r) = request {
            r.delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Get pending requests received by a user, newest first.
    pub async fn find_received_pending(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<friend_request::Model>> {
        FriendRequest::find()
            .filter(friend_request::Column::RecipientId.eq(user_id))
            .filter(friend_request::Column::Accepted.eq(false))
            .order_by_desc(friend_request::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_request(
        id: &str,
        requester_id: &str,
        recipient_id: &str,
        accepted: bool,
    ) -> friend_request::Model {
        friend_request::Model {
            id: id.to_string(),
            requester_id: requester_id.to_string(),
            recipient_id: recipient_id.to_string(),
            accepted,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_pending_by_pair_ignores_accepted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friend_request::Model>::new()])
                .into_connection(),
        );

        let repo = FriendRequestRepository::new(db);
        let result = repo.find_pending_by_pair("user1", "user2").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_received_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_request("r2", "user3", "user1", false),
                    create_test_request("r1", "user2", "user1", false),
                ]])
                .into_connection(),
        );

        let repo = FriendRequestRepository::new(db);
        let pending = repo.find_received_pending("user1").await.unwrap();

        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|r| r.recipient_id == "user1"));
        assert!(pending.iter().all(|r| !r.accepted));
    }
}
