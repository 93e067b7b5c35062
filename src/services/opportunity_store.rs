//! Opportunity persistence
//!
//! The [`OpportunityStore`] trait is the only way handlers reach storage.
//! [`InMemoryOpportunityStore`] backs local runs without a database and the
//! test suite; the PostgreSQL implementation lives in `pg_opportunity_store`.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::interest::{InterestRecord, NewInterest};
use crate::models::opportunity::{Opportunity, OpportunityData, OpportunityFilter};

/// Error types for opportunity persistence
#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Database(String),
    /// Stored row could not be decoded into a record
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "Opportunity not found: {}", id),
            StoreError::Database(msg) => write!(f, "Database error: {}", msg),
            StoreError::Corrupt(msg) => write!(f, "Corrupt record: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Opportunity>, StoreError>;

    /// Persist a validated record; the store assigns id and timestamps
    async fn create(&self, owner_id: &str, data: OpportunityData) -> Result<Opportunity, StoreError>;

    /// Replace the content of an existing record
    async fn update(&self, id: &str, data: OpportunityData) -> Result<Opportunity, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// One page of matching records (newest first) and the total match count
    async fn list(&self, filter: &OpportunityFilter) -> Result<(Vec<Opportunity>, i64), StoreError>;

    /// Store an interest unless the same actor already registered this kind
    /// on the opportunity. Returns the record and whether it is new.
    async fn record_interest(
        &self,
        interest: NewInterest,
    ) -> Result<(InterestRecord, bool), StoreError>;
}

#[derive(Default)]
struct MemoryTables {
    opportunities: HashMap<String, Opportunity>,
    interests: Vec<InterestRecord>,
}

/// Process-local store
#[derive(Clone, Default)]
pub struct InMemoryOpportunityStore {
    tables: Arc<RwLock<MemoryTables>>,
}

impl InMemoryOpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interests recorded against one opportunity
    pub fn interests_for(&self, opportunity_id: &str) -> Vec<InterestRecord> {
        self.tables
            .read()
            .interests
            .iter()
            .filter(|i| i.opportunity_id == opportunity_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryOpportunityStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Opportunity>, StoreError> {
        Ok(self.tables.read().opportunities.get(id).cloned())
    }

    async fn create(&self, owner_id: &str, data: OpportunityData) -> Result<Opportunity, StoreError> {
        let now = Utc::now();
        let opportunity = Opportunity {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            data,
            created_at: now,
            updated_at: now,
        };

        self.tables
            .write()
            .opportunities
            .insert(opportunity.id.clone(), opportunity.clone());
        debug!(opportunity_id = %opportunity.id, "Opportunity stored in memory");
        Ok(opportunity)
    }

    async fn update(&self, id: &str, data: OpportunityData) -> Result<Opportunity, StoreError> {
        let mut tables = self.tables.write();
        let existing = tables
            .opportunities
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        existing.data = data;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if tables.opportunities.remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tables.interests.retain(|i| i.opportunity_id != id);
        Ok(())
    }

    async fn list(&self, filter: &OpportunityFilter) -> Result<(Vec<Opportunity>, i64), StoreError> {
        let tables = self.tables.read();
        let mut matching: Vec<&Opportunity> = tables
            .opportunities
            .values()
            .filter(|opp| filter.matches(opp))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn record_interest(
        &self,
        interest: NewInterest,
    ) -> Result<(InterestRecord, bool), StoreError> {
        let mut tables = self.tables.write();
        if !tables.opportunities.contains_key(&interest.opportunity_id) {
            return Err(StoreError::NotFound(interest.opportunity_id));
        }
        if let Some(existing) = tables.interests.iter().find(|i| {
            i.opportunity_id == interest.opportunity_id
                && i.actor_id == interest.actor_id
                && i.kind == interest.kind
        }) {
            return Ok((existing.clone(), false));
        }

        let record = InterestRecord {
            id: Uuid::new_v4().to_string(),
            opportunity_id: interest.opportunity_id,
            actor_id: interest.actor_id,
            kind: interest.kind,
            message: interest.message,
            created_at: Utc::now(),
        };
        tables.interests.push(record.clone());
        Ok((record, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interest::InterestKind;
    use crate::models::opportunity::LifecycleStatus;
    use crate::services::opportunity_validator::validate;
    use serde_json::json;

    fn sample(status: &str, public_listing: bool) -> OpportunityData {
        validate(&json!({
            "opportunity_name": "Riverside Flats",
            "status": status,
            "property_type": "multifamily",
            "property_address": { "street": "1 Main", "city": "Austin", "state": "TX", "zip": "78701" },
            "total_project_cost": 1000000,
            "equity_requirement": 300000,
            "minimum_investment": 50000,
            "target_raise_amount": 300000,
            "public_listing": public_listing
        }))
        .unwrap()
    }

    fn public_filter() -> OpportunityFilter {
        OpportunityFilter {
            limit: 20,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_fetch_update_delete() {
        let store = InMemoryOpportunityStore::new();
        let created = store.create("sponsor-1", sample("draft", false)).await.unwrap();
        assert_eq!(created.owner_id, "sponsor-1");

        let fetched = store.fetch_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let mut data = fetched.data.clone();
        data.status = LifecycleStatus::Fundraising;
        let updated = store.update(&created.id, data).await.unwrap();
        assert_eq!(updated.data.status, LifecycleStatus::Fundraising);
        assert!(updated.updated_at >= created.updated_at);

        store.delete(&created.id).await.unwrap();
        assert!(store.fetch_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            store.delete(&created.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = InMemoryOpportunityStore::new();
        let result = store.update("nope", sample("draft", false)).await;
        assert!(matches!(result, Err(StoreError::NotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_public_listing_excludes_drafts_and_private() {
        let store = InMemoryOpportunityStore::new();
        store.create("s1", sample("draft", true)).await.unwrap();
        store.create("s1", sample("fundraising", false)).await.unwrap();
        let listed = store.create("s2", sample("fundraising", true)).await.unwrap();

        let (page, total) = store.list(&public_filter()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, listed.id);

        let mine = OpportunityFilter {
            owner_id: Some("s1".to_string()),
            limit: 20,
            ..Default::default()
        };
        let (page, total) = store.list(&mine).await.unwrap();
        assert_eq!(total, 2);
        assert!(page.iter().all(|o| o.owner_id == "s1"));
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = InMemoryOpportunityStore::new();
        for _ in 0..5 {
            store.create("s1", sample("fundraising", true)).await.unwrap();
        }
        let filter = OpportunityFilter {
            limit: 2,
            offset: 4,
            ..Default::default()
        };
        let (page, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_interest_requires_existing_opportunity() {
        let store = InMemoryOpportunityStore::new();
        let missing = store
            .record_interest(NewInterest {
                opportunity_id: "missing".to_string(),
                actor_id: "cp-1".to_string(),
                kind: InterestKind::ExpressInterest,
                message: None,
            })
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));

        let opp = store.create("s1", sample("fundraising", true)).await.unwrap();
        let (record, created) = store
            .record_interest(NewInterest {
                opportunity_id: opp.id.clone(),
                actor_id: "cp-1".to_string(),
                kind: InterestKind::RequestInformation,
                message: Some("Send the rent roll".to_string()),
            })
            .await
            .unwrap();
        assert!(created);
        assert_eq!(record.kind, InterestKind::RequestInformation);
        assert_eq!(store.interests_for(&opp.id).len(), 1);

        store.delete(&opp.id).await.unwrap();
        assert!(store.interests_for(&opp.id).is_empty());
    }

    #[tokio::test]
    async fn test_repeat_interest_returns_existing_record() {
        let store = InMemoryOpportunityStore::new();
        let opp = store.create("s1", sample("fundraising", true)).await.unwrap();
        let interest = |kind, message: &str| NewInterest {
            opportunity_id: opp.id.clone(),
            actor_id: "cp-1".to_string(),
            kind,
            message: Some(message.to_string()),
        };

        let (first, created) = store
            .record_interest(interest(InterestKind::ExpressInterest, "first"))
            .await
            .unwrap();
        assert!(created);

        let (again, created) = store
            .record_interest(interest(InterestKind::ExpressInterest, "second"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again, first);
        assert_eq!(again.message.as_deref(), Some("first"));

        let (_, created) = store
            .record_interest(interest(InterestKind::RequestInformation, "docs"))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(store.interests_for(&opp.id).len(), 2);
    }
}
