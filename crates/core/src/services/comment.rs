//! Comment service.

use plaza_common::{AppError, AppResult, IdGenerator};
use plaza_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Comment service for discussion on posts.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// Input for creating a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 2048))]
    pub body: String,
}

/// Input for updating a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 2048))]
    pub body: String,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment to a post.
    pub async fn create(
        &self,
        author_id: &str,
        post_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        self.post_repo.get_by_id(post_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            author_id: Set(author_id.to_string()),
            body: Set(input.body),
            ..Default::default()
        };

        self.comment_repo.create(model).await
    }

    /// Update a comment. Only the author may edit.
    pub async fn update(
        &self,
        acting_user_id: &str,
        comment_id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.author_id != acting_user_id {
            return Err(AppError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.body = Set(input.body);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.comment_repo.update(active).await
    }

    /// Delete a comment. Only the author may delete.
    pub async fn delete(&self, acting_user_id: &str, comment_id: &str) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.author_id != acting_user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.comment_repo.delete(comment_id).await
    }

    /// List a post's comments in conversation order, oldest first.
    pub async fn list_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        self.post_repo.get_by_id(post_id).await?;
        self.comment_repo.list_by_post(post_id).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::Utc;
    use plaza_db::entities::post;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            body: "Hello".to_string(),
            image_url: None,
            map_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_comment(id: &str, post_id: &str, author_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            body: "Nice post".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(
        comment_db: Arc<sea_orm::DatabaseConnection>,
        post_db: Arc<sea_orm::DatabaseConnection>,
    ) -> CommentService {
        CommentService::new(
            CommentRepository::new(comment_db),
            PostRepository::new(post_db),
        )
    }

    fn empty_mock() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    #[tokio::test]
    async fn test_create_comment() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("post1", "user1")]])
                .into_connection(),
        );
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("comment1", "post1", "user2")]])
                .into_connection(),
        );

        let service = create_test_service(comment_db, post_db);

        let input = CreateCommentInput {
            body: "Nice post".to_string(),
        };

        let comment = service.create("user2", "post1", input).await.unwrap();
        assert_eq!(comment.post_id, "post1");
        assert_eq!(comment.author_id, "user2");
    }

    #[tokio::test]
    async fn test_create_comment_missing_post() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(empty_mock(), post_db);

        let input = CreateCommentInput {
            body: "Nice post".to_string(),
        };

        let result = service.create("user2", "nonexistent", input).await;
        match result {
            Err(AppError::PostNotFound(_)) => {}
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_update_comment_requires_author() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("comment1", "post1", "user2")]])
                .into_connection(),
        );

        let service = create_test_service(comment_db, empty_mock());

        let input = UpdateCommentInput {
            body: "Edited".to_string(),
        };

        let result = service.update("user3", "comment1", input).await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[tokio::test]
    async fn test_delete_comment_requires_author() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("comment1", "post1", "user2")]])
                .into_connection(),
        );

        let service = create_test_service(comment_db, empty_mock());

        let result = service.delete("user3", "comment1").await;
        match result {
            Err(AppError::Forbidden(_)) => {}
            _ => panic!("Expected Forbidden error"),
        }
    }

    #[test]
    fn test_comment_body_validation() {
        let input = CreateCommentInput {
            body: String::new(),
        };
        assert!(input.validate().is_err());

        let input = CreateCommentInput {
            body: "a".repeat(3000),
        };
        assert!(input.validate().is_err());

        let input = CreateCommentInput {
            body: "fine".to_string(),
        };
        assert!(input.validate().is_ok());
    }
}
