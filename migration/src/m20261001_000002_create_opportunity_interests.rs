//! Migration to create the opportunity_interests table
//!
//! Express-interest and request-information entries from capital partners.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_opportunities::Opportunities;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OpportunityInterests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OpportunityInterests::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OpportunityInterests::OpportunityId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OpportunityInterests::ActorId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OpportunityInterests::Kind)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(OpportunityInterests::Message).text().null())
                    .col(
                        ColumnDef::new(OpportunityInterests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_opportunity_interests_opportunity")
                            .from(OpportunityInterests::Table, OpportunityInterests::OpportunityId)
                            .to(Opportunities::Table, Opportunities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_opportunity_interests_opportunity_id")
                    .table(OpportunityInterests::Table)
                    .col(OpportunityInterests::OpportunityId)
                    .to_owned(),
            )
            .await?;

        // one entry per actor and kind on an opportunity
        manager
            .create_index(
                Index::create()
                    .name("idx_opportunity_interests_unique_actor_kind")
                    .table(OpportunityInterests::Table)
                    .col(OpportunityInterests::OpportunityId)
                    .col(OpportunityInterests::ActorId)
                    .col(OpportunityInterests::Kind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OpportunityInterests::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OpportunityInterests {
    Table,
    Id,
    OpportunityId,
    ActorId,
    Kind,
    Message,
    CreatedAt,
}
