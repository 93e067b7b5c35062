//! `SeaORM` Entity prelude

pub use super::opportunities::Entity as Opportunities;
pub use super::opportunity_interests::Entity as OpportunityInterests;
