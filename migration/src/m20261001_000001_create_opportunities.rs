//! Migration to create the opportunities table
//!
//! Listing filters hit the indexed columns; the validated record is kept in
//! `data` as JSONB.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Opportunities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Opportunities::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::OwnerId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::Status)
                            .string_len(32)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Opportunities::PropertyType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::PublicListing)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Opportunities::FeaturedListing)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Opportunities::Data)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Opportunities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Opportunities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Owner dashboard ("mine") lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_opportunities_owner_id")
                    .table(Opportunities::Table)
                    .col(Opportunities::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Public listing filter
        manager
            .create_index(
                Index::create()
                    .name("idx_opportunities_public_status")
                    .table(Opportunities::Table)
                    .col(Opportunities::PublicListing)
                    .col(Opportunities::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_opportunities_created_at")
                    .table(Opportunities::Table)
                    .col(Opportunities::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Opportunities::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(crate) enum Opportunities {
    Table,
    Id,
    OwnerId,
    Name,
    Status,
    PropertyType,
    PublicListing,
    FeaturedListing,
    Data,
    CreatedAt,
    UpdatedAt,
}
