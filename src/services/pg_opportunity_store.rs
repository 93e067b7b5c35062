//! PostgreSQL opportunity store backed by SeaORM

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{
    opportunities, opportunity_interests,
    prelude::{Opportunities, OpportunityInterests},
};
use crate::models::interest::{InterestKind, InterestRecord, NewInterest};
use crate::models::opportunity::{
    ClosedSet, LifecycleStatus, Opportunity, OpportunityData, OpportunityFilter,
};
use crate::services::opportunity_store::{OpportunityStore, StoreError};

#[derive(Clone)]
pub struct PgOpportunityStore {
    db: DatabaseConnection,
}

impl PgOpportunityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn encode_data(data: &OpportunityData) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(data).map_err(|e| StoreError::Corrupt(format!("encode failed: {}", e)))
}

fn decode_model(model: opportunities::Model) -> Result<Opportunity, StoreError> {
    let data: OpportunityData = serde_json::from_value(model.data)
        .map_err(|e| StoreError::Corrupt(format!("opportunity {}: {}", model.id, e)))?;

    Ok(Opportunity {
        id: model.id,
        owner_id: model.owner_id,
        data,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn decode_interest(model: opportunity_interests::Model) -> Result<InterestRecord, StoreError> {
    let kind = InterestKind::parse(&model.kind)
        .ok_or_else(|| StoreError::Corrupt(format!("interest {}: kind '{}'", model.id, model.kind)))?;

    Ok(InterestRecord {
        id: model.id,
        opportunity_id: model.opportunity_id,
        actor_id: model.actor_id,
        kind,
        message: model.message,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl OpportunityStore for PgOpportunityStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Opportunity>, StoreError> {
        Opportunities::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(decode_model)
            .transpose()
    }

    async fn create(&self, owner_id: &str, data: OpportunityData) -> Result<Opportunity, StoreError> {
        let now = Utc::now();
        let row = opportunities::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            owner_id: Set(owner_id.to_string()),
            name: Set(data.opportunity_name.clone()),
            status: Set(data.status.as_str().to_string()),
            property_type: Set(data.property_type.as_str().to_string()),
            public_listing: Set(data.visibility.public_listing),
            featured_listing: Set(data.visibility.featured_listing),
            data: Set(encode_data(&data)?),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = row.insert(&self.db).await?;
        info!(opportunity_id = %inserted.id, owner_id = %owner_id, "Opportunity inserted");
        decode_model(inserted)
    }

    async fn update(&self, id: &str, data: OpportunityData) -> Result<Opportunity, StoreError> {
        let existing = Opportunities::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut row = existing.into_active_model();
        row.name = Set(data.opportunity_name.clone());
        row.status = Set(data.status.as_str().to_string());
        row.property_type = Set(data.property_type.as_str().to_string());
        row.public_listing = Set(data.visibility.public_listing);
        row.featured_listing = Set(data.visibility.featured_listing);
        row.data = Set(encode_data(&data)?);
        row.updated_at = Set(Utc::now().into());

        let updated = row.update(&self.db).await?;
        debug!(opportunity_id = %id, "Opportunity updated");
        decode_model(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = Opportunities::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: &OpportunityFilter) -> Result<(Vec<Opportunity>, i64), StoreError> {
        let mut select = Opportunities::find();

        select = match filter.owner_id {
            Some(ref owner) => select.filter(opportunities::Column::OwnerId.eq(owner)),
            None => select
                .filter(opportunities::Column::PublicListing.eq(true))
                .filter(opportunities::Column::Status.ne(LifecycleStatus::Draft.as_str())),
        };

        if let Some(featured) = filter.featured {
            select = select.filter(opportunities::Column::FeaturedListing.eq(featured));
        }
        if let Some(pt) = filter.property_type {
            select = select.filter(opportunities::Column::PropertyType.eq(pt.as_str()));
        }
        if let Some(status) = filter.status {
            select = select.filter(opportunities::Column::Status.eq(status.as_str()));
        }

        let total = select.clone().count(&self.db).await? as i64;

        let rows = select
            .order_by_desc(opportunities::Column::CreatedAt)
            .order_by_asc(opportunities::Column::Id)
            .offset(filter.offset)
            .limit(filter.limit)
            .all(&self.db)
            .await?;

        let page = rows
            .into_iter()
            .map(decode_model)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((page, total))
    }

    async fn record_interest(
        &self,
        interest: NewInterest,
    ) -> Result<(InterestRecord, bool), StoreError> {
        let exists = Opportunities::find_by_id(interest.opportunity_id.clone())
            .one(&self.db)
            .await?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound(interest.opportunity_id));
        }

        let existing = OpportunityInterests::find()
            .filter(opportunity_interests::Column::OpportunityId.eq(interest.opportunity_id.as_str()))
            .filter(opportunity_interests::Column::ActorId.eq(interest.actor_id.as_str()))
            .filter(opportunity_interests::Column::Kind.eq(interest.kind.as_str()))
            .one(&self.db)
            .await?;
        if let Some(model) = existing {
            debug!(interest_id = %model.id, "Interest already recorded");
            return Ok((decode_interest(model)?, false));
        }

        let row = opportunity_interests::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            opportunity_id: Set(interest.opportunity_id),
            actor_id: Set(interest.actor_id),
            kind: Set(interest.kind.as_str().to_string()),
            message: Set(interest.message),
            created_at: Set(Utc::now().into()),
        };
        let inserted = row.insert(&self.db).await?;
        Ok((decode_interest(inserted)?, true))
    }
}
