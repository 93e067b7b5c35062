//! SeaORM Entity for opportunities
//!
//! Indexed columns mirror the fields used for listing filters; the full
//! validated record lives in `data`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "opportunities")]
pub struct Model {
    /// UUID v4 assigned on creation
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Sponsor who created the listing
    pub owner_id: String,
    pub name: String,
    /// Lifecycle status wire name (e.g., "fundraising")
    pub status: String,
    /// Property type wire name (e.g., "multifamily")
    pub property_type: String,
    pub public_listing: bool,
    pub featured_listing: bool,
    /// Normalized opportunity content as JSON
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::opportunity_interests::Entity")]
    OpportunityInterests,
}

impl Related<super::opportunity_interests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OpportunityInterests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
