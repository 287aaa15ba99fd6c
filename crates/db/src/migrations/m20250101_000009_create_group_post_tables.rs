//! Create `group_post` and `group_comment` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GroupPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupPost::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPost::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupPost::Body).text().not_null())
                    .col(ColumnDef::new(GroupPost::ImageUrl).string_len(1024))
                    .col(
                        ColumnDef::new(GroupPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(GroupPost::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_group")
                            .from(GroupPost::Table, GroupPost::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_post_author")
                            .from(GroupPost::Table, GroupPost::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: group_id (for group feeds)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_post_group_id")
                    .table(GroupPost::Table)
                    .col(GroupPost::GroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GroupComment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupComment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupComment::GroupPostId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupComment::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupComment::Body).text().not_null())
                    .col(
                        ColumnDef::new(GroupComment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(GroupComment::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_comment_post")
                            .from(GroupComment::Table, GroupComment::GroupPostId)
                            .to(GroupPost::Table, GroupPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_comment_author")
                            .from(GroupComment::Table, GroupComment::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: group_post_id (for listing a post's comments)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_comment_post_id")
                    .table(GroupComment::Table)
                    .col(GroupComment::GroupPostId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupComment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum GroupPost {
    Table,
    Id,
    GroupId,
    AuthorId,
    Body,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupComment {
    Table,
    Id,
    GroupPostId,
    AuthorId,
    Body,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
