//! Friendship service.
//!
//! Friendships are symmetric and stored as two directed rows, one per
//! direction. Both rows are always written and deleted together inside
//! a transaction, so the relation can never be observed one-sided.

use plaza_common::{AppError, AppResult, IdGenerator};
use plaza_db::{
    entities::{friend_request, friendship, user},
    repositories::{FriendRequestRepository, FriendshipRepository, UserRepository},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;

/// Friendship service for the request/accept workflow.
#[derive(Clone)]
pub struct FriendshipService {
    db: Arc<DatabaseConnection>,
    request_repo: FriendRequestRepository,
    friendship_repo: FriendshipRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FriendshipService {
    /// Create a new friendship service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        request_repo: FriendRequestRepository,
        friendship_repo: FriendshipRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            db,
            request_repo,
            friendship_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a friend request.
    ///
    /// At most one pending request per ordered pair ever exists.
    pub async fn send_request(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> AppResult<friend_request::Model> {
        if requester_id == recipient_id {
            return Err(AppError::Validation(
                "Cannot send a friend request to yourself".to_string(),
            ));
        }

        self.user_repo.get_by_id(recipient_id).await?;

        if self
            .request_repo
            .find_pending_by_pair(requester_id, recipient_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A pending friend request already exists".to_string(),
            ));
        }

        if self
            .friendship_repo
            .are_friends(requester_id, recipient_id)
            .await?
        {
            return Err(AppError::Conflict("Already friends".to_string()));
        }

        let model = friend_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            requester_id: Set(requester_id.to_string()),
            recipient_id: Set(recipient_id.to_string()),
            ..Default::default()
        };

        self.request_repo.create(model).await
    }

    /// Accept a friend request. Only the recipient may accept.
    ///
    /// In one transaction the request is flagged accepted and both
    /// friendship rows are inserted. Either everything commits or
    /// nothing does.
    pub async fn accept_request(
        &self,
        acting_user_id: &str,
        request_id: &str,
    ) -> AppResult<friend_request::Model> {
        let request = self
            .request_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("FriendRequest: {request_id}")))?;

        if request.recipient_id != acting_user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can accept a friend request".to_string(),
            ));
        }
        if request.accepted {
            return Err(AppError::Conflict(
                "Friend request already accepted".to_string(),
            ));
        }

        let requester_id = request.requester_id.clone();
        let recipient_id = request.recipient_id.clone();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut active: friend_request::ActiveModel = request.into();
        active.accepted = Set(true);
        let request = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        friendship::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(requester_id.clone()),
            friend_id: Set(recipient_id.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        friendship::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(recipient_id),
            friend_id: Set(requester_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(requester_id = %request.requester_id, recipient_id = %request.recipient_id, "Accepted friend request");

        Ok(request)
    }

    /// Reject a friend request. Only the recipient may reject.
    ///
    /// The request row is deleted, so the pair may try again later.
    pub async fn reject_request(&self, acting_user_id: &str, request_id: &str) -> AppResult<()> {
        let request = self
            .request_repo
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("FriendRequest: {request_id}")))?;

        if request.recipient_id != acting_user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can reject a friend request".to_string(),
            ));
        }
        if request.accepted {
            return Err(AppError::Conflict(
                "Friend request already accepted".to_string(),
            ));
        }

        self.request_repo.delete(&request.id).await
    }

    /// Remove a friendship.
    ///
    /// Both directed rows and any accepted request rows between the two
    /// users are deleted in one transaction. Removal is symmetric:
    /// afterwards neither side sees the other as a friend, and either
    /// side may send a fresh request.
    pub async fn remove_friend(&self, user_id: &str, friend_id: &str) -> AppResult<()> {
        self.friendship_repo
            .find_by_pair(user_id, friend_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Friendship: {friend_id}")))?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        friendship::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(
                        friendship::Column::UserId
                            .eq(user_id)
                            .and(friendship::Column::FriendId.eq(friend_id)),
                    )
                    .add(
                        friendship::Column::UserId
                            .eq(friend_id)
                            .and(friendship::Column::FriendId.eq(user_id)),
                    ),
            )
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        friend_request::Entity::delete_many()
            .filter(friend_request::Column::Accepted.eq(true))
            .filter(
                Condition::any()
                    .add(
                        friend_request::Column::RequesterId
                            .eq(user_id)
                            .and(friend_request::Column::RecipientId.eq(friend_id)),
                    )
                    .add(
                        friend_request::Column::RequesterId
                            .eq(friend_id)
                            .and(friend_request::Column::RecipientId.eq(user_id)),
                    ),
            )
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(user_id = %user_id, friend_id = %friend_id, "Removed friendship");

        Ok(())
    }

    /// List pending requests received by a user, newest first.
    pub async fn list_pending(&self, user_id: &str) -> AppResult<Vec<friend_request::Model>> {
        self.request_repo.find_received_pending(user_id).await
    }

    /// List a user's friends.
    pub async fn list_friends(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let friendships = self.friendship_repo.find_friends(user_id).await?;
        let friend_ids: Vec<String> = friendships.into_iter().map(|f| f.friend_id).collect();
        self.user_repo.find_by_ids(&friend_ids).await
    }

    /// Check whether two users are friends.
    pub async fn are_friends(&self, user_id: &str, other_id: &str) -> AppResult<bool> {
        self.friendship_repo.are_friends(user_id, other_id).await
    }

    /// Count a user's friends.
    pub async fn count_friends(&self, user_id: &str) -> AppResult<u64> {
        self.friendship_repo.count_friends(user_id).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            display_name: "Test User".to_string(),
            token: None,
            is_active: true,
            is_staff: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

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

    fn create_test_friendship(id: &str, user_id: &str, friend_id: &str) -> friendship::Model {
        friendship::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            friend_id: friend_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn create_test_service(
        db: Arc<sea_orm::DatabaseConnection>,
        request_db: Arc<sea_orm::DatabaseConnection>,
        friendship_db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
    ) -> FriendshipService {
        FriendshipService::new(
            db,
            FriendRequestRepository::new(request_db),
            FriendshipRepository::new(friendship_db),
            UserRepository::new(user_db),
        )
    }

    fn empty_mock() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[tokio::test]
    async fn test_send_request_to_self() {
        let service = create_test_service(empty_mock(), empty_mock(), empty_mock(), empty_mock());

        let result = service.send_request("user1", "user1").await;
        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("yourself")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_send_request_recipient_not_found() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), empty_mock(), empty_mock(), user_db);

        let result = service.send_request("user1", "nonexistent").await;
        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_send_request_already_pending() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user2", "bob")]])
                .into_connection(),
        );
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, empty_mock(), user_db);

        let result = service.send_request("user1", "user2").await;
        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("pending")),
            _ => panic!("Expected Conflict error"),
        }
    }

    #[tokio::test]
    async fn test_send_request_already_friends() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user2", "bob")]])
                .into_connection(),
        );
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friend_request::Model>::new()])
                .into_connection(),
        );
        let friendship_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_friendship("f1", "user1", "user2")]])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, friendship_db, user_db);

        let result = service.send_request("user1", "user2").await;
        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("friends")),
            _ => panic!("Expected Conflict error"),
        }
    }

    #[tokio::test]
    async fn test_send_request_success() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user2", "bob")]])
                .into_connection(),
        );
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friend_request::Model>::new()])
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                .into_connection(),
        );
        let friendship_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friendship::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, friendship_db, user_db);

        let request = service.send_request("user1", "user2").await.unwrap();
        assert_eq!(request.requester_id, "user1");
        assert_eq!(request.recipient_id, "user2");
        assert!(!request.accepted);
    }

    #[tokio::test]
    async fn test_accept_request_not_found() {
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friend_request::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, empty_mock(), empty_mock());

        let result = service.accept_request("user2", "req1").await;
        match result {
            Err(AppError::NotFound(_)) => {}
            _ => panic!("Expected NotFound error"),
        }
    }

    #[tokio::test]
    async fn test_accept_request_requires_recipient() {
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, empty_mock(), empty_mock());

        // The requester cannot accept their own request.
        let result = service.accept_request("user1", "req1").await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_accept_request_already_accepted() {
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", true)]])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, empty_mock(), empty_mock());

        let result = service.accept_request("user2", "req1").await;
        match result {
            Err(AppError::Conflict(_)) => {}
            _ => panic!("Expected Conflict error"),
        }
    }

    #[tokio::test]
    async fn test_accept_request_creates_both_rows() {
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                .into_connection(),
        );
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", true)]])
                .append_query_results([[create_test_friendship("f1", "user1", "user2")]])
                .append_query_results([[create_test_friendship("f2", "user2", "user1")]])
                .into_connection(),
        );

        let service = create_test_service(db, request_db, empty_mock(), empty_mock());

        let request = service.accept_request("user2", "req1").await.unwrap();
        assert!(request.accepted);
    }

    #[tokio::test]
    async fn test_reject_request_requires_recipient() {
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, empty_mock(), empty_mock());

        let result = service.reject_request("user3", "req1").await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_reject_request_deletes_row() {
        let request_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                // `FriendRequestRepository::delete` re-fetches the row
                // before deleting, so the mock serves it a second time.
                .append_query_results([[create_test_request("req1", "user1", "user2", false)]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), request_db, empty_mock(), empty_mock());

        service.reject_request("user2", "req1").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_friend_not_friends() {
        let friendship_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friendship::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), empty_mock(), friendship_db, empty_mock());

        let result = service.remove_friend("user1", "user2").await;
        match result {
            Err(AppError::NotFound(_)) => {}
            _ => panic!("Expected NotFound error"),
        }
    }

    #[tokio::test]
    async fn test_remove_friend_deletes_both_directions() {
        let friendship_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_friendship("f1", "user1", "user2")]])
                .into_connection(),
        );
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let service = create_test_service(db, empty_mock(), friendship_db, empty_mock());

        service.remove_friend("user1", "user2").await.unwrap();
    }

    #[tokio::test]
    async fn test_are_friends() {
        let friendship_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_friendship("f1", "user1", "user2")]])
                .append_query_results([Vec::<friendship::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), empty_mock(), friendship_db, empty_mock());

        assert!(service.are_friends("user1", "user2").await.unwrap());
        assert!(!service.are_friends("user1", "user3").await.unwrap());
    }
}
