//! Group service.
//!
//! Group membership only grows. The creator is a member from the
//! instant the group exists and there is no removal or leave operation.

use plaza_common::{AppError, AppResult, IdGenerator};
use plaza_db::{
    entities::{group, group_comment, group_member, group_post, user},
    repositories::{GroupPostRepository, GroupRepository, UserRepository},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

/// Group service for closed member circles.
#[derive(Clone)]
pub struct GroupService {
    db: Arc<DatabaseConnection>,
    group_repo: GroupRepository,
    group_post_repo: GroupPostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

/// Input for posting inside a group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupPostInput {
    #[validate(length(min = 1, max = 8192))]
    pub body: String,

    pub image_url: Option<String>,
}

/// Input for commenting on a group post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupCommentInput {
    #[validate(length(min = 1, max = 2048))]
    pub body: String,
}

/// Result of a batch member addition.
#[derive(Debug, Clone)]
pub struct AddMembersResult {
    /// IDs actually added by this call.
    pub added: Vec<String>,
    /// IDs that were already members and were skipped.
    pub skipped: Vec<String>,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        group_repo: GroupRepository,
        group_post_repo: GroupPostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            db,
            group_repo,
            group_post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a group.
    ///
    /// The group row and the creator's membership row are inserted in one
    /// transaction, so the group is never observable without its creator
    /// as a member.
    pub async fn create(
        &self,
        creator_id: &str,
        input: CreateGroupInput,
    ) -> AppResult<group::Model> {
        input.validate()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let group = group::ActiveModel {
            id: Set(self.id_gen.generate()),
            creator_id: Set(creator_id.to_string()),
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        group_member::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group.id.clone()),
            user_id: Set(creator_id.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(group_id = %group.id, creator_id = %creator_id, "Created group");

        Ok(group)
    }

    /// Get a group by ID.
    pub async fn get(&self, group_id: &str) -> AppResult<group::Model> {
        self.group_repo.get_by_id(group_id).await
    }

    /// List groups the user belongs to.
    pub async fn list_joined(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_joined_by_user(user_id, limit, offset).await
    }

    /// List a group's members, oldest first.
    pub async fn list_members(
        &self,
        acting_user_id: &str,
        group_id: &str,
    ) -> AppResult<Vec<group_member::Model>> {
        self.require_member(group_id, acting_user_id).await?;
        self.group_repo.list_members(group_id).await
    }

    /// Add members to a group as a batch. Only members may add.
    ///
    /// Set semantics: IDs already in the group are silently skipped,
    /// never an error. All new rows are inserted in one transaction.
    pub async fn add_members(
        &self,
        acting_user_id: &str,
        group_id: &str,
        user_ids: Vec<String>,
    ) -> AppResult<AddMembersResult> {
        self.group_repo.get_by_id(group_id).await?;
        self.require_member(group_id, acting_user_id).await?;

        // Dedupe while keeping request order.
        let mut seen = HashSet::new();
        let user_ids: Vec<String> = user_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if user_ids.is_empty() {
            return Ok(AddMembersResult {
                added: vec![],
                skipped: vec![],
            });
        }

        let found = self.user_repo.find_by_ids(&user_ids).await?;
        if found.len() != user_ids.len() {
            let found_ids: HashSet<&str> = found.iter().map(|u| u.id.as_str()).collect();
            let missing = user_ids
                .iter()
                .find(|id| !found_ids.contains(id.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(AppError::UserNotFound(missing));
        }

        let existing: HashSet<String> = self
            .group_repo
            .existing_member_ids(group_id, &user_ids)
            .await?
            .into_iter()
            .collect();

        let mut added = Vec::new();
        let mut skipped = Vec::new();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for user_id in user_ids {
            if existing.contains(&user_id) {
                skipped.push(user_id);
                continue;
            }

            group_member::ActiveModel {
                id: Set(self.id_gen.generate()),
                group_id: Set(group_id.to_string()),
                user_id: Set(user_id.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

            added.push(user_id);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(group_id = %group_id, added = added.len(), skipped = skipped.len(), "Added group members");

        Ok(AddMembersResult { added, skipped })
    }

    /// Check whether a user is a member of a group.
    pub async fn is_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        self.group_repo.is_member(group_id, user_id).await
    }

    /// Create a post inside a group. Members only.
    pub async fn create_post(
        &self,
        author_id: &str,
        group_id: &str,
        input: CreateGroupPostInput,
    ) -> AppResult<group_post::Model> {
        input.validate()?;

        self.group_repo.get_by_id(group_id).await?;
        self.require_member(group_id, author_id).await?;

        let model = group_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            author_id: Set(author_id.to_string()),
            body: Set(input.body),
            image_url: Set(input.image_url),
            ..Default::default()
        };

        self.group_post_repo.create(model).await
    }

    /// List a group's posts, newest first. Members only.
    pub async fn list_posts(
        &self,
        acting_user_id: &str,
        group_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<group_post::Model>> {
        self.require_member(group_id, acting_user_id).await?;
        self.group_post_repo.list_by_group(group_id, limit, offset).await
    }

    /// Delete a group post. Only the author may delete.
    pub async fn delete_post(&self, acting_user_id: &str, group_post_id: &str) -> AppResult<()> {
        let post = self.group_post_repo.get_by_id(group_post_id).await?;
        if post.author_id != acting_user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.group_post_repo.delete(group_post_id).await
    }

    /// Comment on a group post. Members only.
    pub async fn add_comment(
        &self,
        author_id: &str,
        group_post_id: &str,
        input: CreateGroupCommentInput,
    ) -> AppResult<group_comment::Model> {
        input.validate()?;

        let post = self.group_post_repo.get_by_id(group_post_id).await?;
        self.require_member(&post.group_id, author_id).await?;

        let model = group_comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_post_id: Set(group_post_id.to_string()),
            author_id: Set(author_id.to_string()),
            body: Set(input.body),
            ..Default::default()
        };

        self.group_post_repo.create_comment(model).await
    }

    /// Delete a group comment. Only the author may delete.
    pub async fn delete_comment(
        &self,
        acting_user_id: &str,
        comment_id: &str,
    ) -> AppResult<()> {
        let comment = self
            .group_post_repo
            .find_comment_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("GroupComment: {comment_id}")))?;

        if comment.author_id != acting_user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        self.group_post_repo.delete_comment(comment_id).await
    }

    /// List a group post's comments in conversation order. Members only.
    pub async fn list_comments(
        &self,
        acting_user_id: &str,
        group_post_id: &str,
    ) -> AppResult<Vec<group_comment::Model>> {
        let post = self.group_post_repo.get_by_id(group_post_id).await?;
        self.require_member(&post.group_id, acting_user_id).await?;

        self.group_post_repo.list_comments(group_post_id).await
    }

    async fn require_member(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        if !self.group_repo.is_member(group_id, user_id).await? {
            return Err(AppError::Forbidden(
                "Only group members can do this".to_string(),
            ));
        }
        Ok(())
    }
}
