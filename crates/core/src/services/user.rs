//! User service.

use plaza_common::{hash_password, verify_password, AppError, AppResult, IdGenerator};
use plaza_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// User service for account registration, authentication and lifecycle.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 1, max = 256))]
    pub display_name: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating an account.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub display_name: Option<String>,

    /// New password. Empty or absent leaves the current password untouched.
    pub password: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
    ) -> Self {
        Self {
            db,
            user_repo,
            profile_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    ///
    /// The account row and its profile row are inserted in one transaction,
    /// so a user never exists without a profile.
    pub async fn register(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = user::ActiveModel {
            id: Set(user_id.clone()),
            email: Set(input.email),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            display_name: Set(input.display_name),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(Some(password_hash)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered account");

        Ok(user)
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email, wrong password and inactive accounts all fail with
    /// `Unauthorized`, so callers cannot discover which emails exist.
    /// On success a fresh bearer token is issued and stored.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_hash = profile.password.ok_or(AppError::Unauthorized)?;
        if !verify_password(password, &password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Resolve a bearer token to an account.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Invalidate the stored bearer token.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.token = Set(None);
        self.user_repo.update(active).await?;

        Ok(())
    }

    /// Get an account by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List accounts, newest first.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(limit, offset).await
    }

    /// Update an account.
    ///
    /// A non-empty `password` replaces the stored hash; empty or absent
    /// leaves it untouched. When a password change accompanies the
    /// account update, both writes share one transaction so a failed
    /// account update never leaves a half-applied password behind.
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        if let Some(email) = &input.email {
            if let Some(existing) = self.user_repo.find_by_email(email).await? {
                if existing.id != user.id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
        }
        if let Some(username) = &input.username {
            if let Some(existing) = self.user_repo.find_by_username(username).await? {
                if existing.id != user.id {
                    return Err(AppError::Conflict("Username already taken".to_string()));
                }
            }
        }

        let password_hash = match &input.password {
            Some(password) if !password.is_empty() => {
                if password.len() < 8 {
                    return Err(AppError::Validation(
                        "Password must be at least 8 characters".to_string(),
                    ));
                }
                Some(hash_password(password)?)
            }
            _ => None,
        };

        let user_id = user.id.clone();
        let mut active: user::ActiveModel = user.into();
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(username) = input.username {
            active.username_lower = Set(username.to_lowercase());
            active.username = Set(username);
        }
        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let Some(hash) = password_hash else {
            return self.user_repo.update(active).await;
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(Some(hash)),
            updated_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        }
        .update(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Delete an account. Only the account owner or staff may delete.
    ///
    /// The profile, posts, comments, likes, friendships, friend requests
    /// and group memberships disappear with the row via FK cascade.
    pub async fn delete(&self, acting_user: &user::Model, target_id: &str) -> AppResult<()> {
        if acting_user.id != target_id && !acting_user.is_staff {
            return Err(AppError::Forbidden(
                "Only the account owner or staff can delete an account".to_string(),
            ));
        }

        self.user_repo.get_by_id(target_id).await?;
        self.user_repo.delete(target_id).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            display_name: "Test User".to_string(),
            token: Some("test_token".to_string()),
            is_active: true,
            is_staff: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_profile(user_id: &str, password_hash: Option<String>) -> user_profile::Model {
        user_profile::Model {
            user_id: user_id.to_string(),
            password: password_hash,
            bio: None,
            avatar_url: None,
            cover_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(
        db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
        profile_db: Arc<sea_orm::DatabaseConnection>,
    ) -> UserService {
        let user_repo = UserRepository::new(user_db);
        let profile_repo = UserProfileRepository::new(profile_db);
        UserService::new(db, user_repo, profile_repo)
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let result = service.get("nonexistent").await;
        assert!(result.is_err());
        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user1", "alice")]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = CreateUserInput {
            email: "alice@example.com".to_string(),
            username: "alice2".to_string(),
            display_name: "Alice".to_string(),
            password: "password123".to_string(),
        };

        let result = service.register(input).await;
        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("Email")),
            _ => panic!("Expected Conflict error"),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[create_test_user("user1", "alice")]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = CreateUserInput {
            email: "other@example.com".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            password: "password123".to_string(),
        };

        let result = service.register(input).await;
        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("Username")),
            _ => panic!("Expected Conflict error"),
        }
    }

    #[tokio::test]
    async fn test_register_creates_user_and_profile() {
        let created = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Some("$argon2$hash".to_string()));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created.clone()]])
                .append_query_results([[profile]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = CreateUserInput {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            password: "password123".to_string(),
        };

        let user = service.register(input).await.unwrap();
        assert_eq!(user.id, "user1");
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let result = service
            .authenticate("nobody@example.com", "password123")
            .await;
        match result {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let hash = hash_password("correct_password").unwrap();

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user1", "alice")]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_profile("user1", Some(hash))]])
                .into_connection(),
        );

        let service = create_test_service(db, user_db, profile_db);

        let result = service
            .authenticate("alice@example.com", "wrong_password")
            .await;
        match result {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_inactive_account() {
        let mut user = create_test_user("user1", "alice");
        user.is_active = false;

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let result = service
            .authenticate("alice@example.com", "password123")
            .await;
        match result {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user1", "alice")]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let user = service.authenticate_by_token("test_token").await.unwrap();
        assert_eq!(user.id, "user1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_not_found() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let result = service.authenticate_by_token("invalid").await;
        match result {
            Err(AppError::Unauthorized) => {}
            _ => panic!("Expected Unauthorized error"),
        }
    }

    #[tokio::test]
    async fn test_update_with_empty_password_keeps_hash() {
        let existing = create_test_user("user1", "alice");
        let mut updated = existing.clone();
        updated.display_name = "Alice Renamed".to_string();

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[updated]])
                .into_connection(),
        );
        // No queued results: any password write here would fail the test.
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = UpdateUserInput {
            email: None,
            username: None,
            display_name: Some("Alice Renamed".to_string()),
            password: Some(String::new()),
        };

        let result = service.update("user1", input).await.unwrap();
        assert_eq!(result.display_name, "Alice Renamed");
    }

    #[tokio::test]
    async fn test_update_rejects_short_password() {
        let existing = create_test_user("user1", "alice");

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = UpdateUserInput {
            email: None,
            username: None,
            display_name: None,
            password: Some("short".to_string()),
        };

        let result = service.update("user1", input).await;
        match result {
            Err(AppError::Validation(msg)) => assert!(msg.contains("8 characters")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_update_password_and_account_share_transaction() {
        let existing = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Some("$argon2$newhash".to_string()));

        // Both writes run on the service's own connection inside one
        // transaction; the repo connections only serve the lookup.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .append_query_results([[existing.clone()]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = UpdateUserInput {
            email: None,
            username: None,
            display_name: None,
            password: Some("newpassword123".to_string()),
        };

        let result = service.update("user1", input).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_password_fails_with_account_update() {
        let existing = create_test_user("user1", "alice");
        let profile = create_test_profile("user1", Some("$argon2$newhash".to_string()));

        // The password write succeeds but the account write has no
        // queued result, so the transaction aborts and the whole
        // update fails.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let input = UpdateUserInput {
            email: None,
            username: None,
            display_name: None,
            password: Some("newpassword123".to_string()),
        };

        let result = service.update("user1", input).await;
        match result {
            Err(AppError::Database(_)) => {}
            _ => panic!("Expected Database error"),
        }
    }

    #[tokio::test]
    async fn test_delete_requires_owner_or_staff() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        let acting = create_test_user("user1", "alice");
        let result = service.delete(&acting, "user2").await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_delete_as_staff() {
        let mut acting = create_test_user("staff1", "admin");
        acting.is_staff = true;

        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user2", "bob")]])
                // `UserRepository::delete` re-fetches the row before
                // deleting, so the mock serves it a second time.
                .append_query_results([[create_test_user("user2", "bob")]])
                .append_exec_results([sea_orm::MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let profile_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = create_test_service(db, user_db, profile_db);

        service.delete(&acting, "user2").await.unwrap();
    }

    #[test]
    fn test_create_user_input_validation() {
        let input = CreateUserInput {
            email: "not-an-email".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = CreateUserInput {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());

        let input = CreateUserInput {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_ok());
    }
}
