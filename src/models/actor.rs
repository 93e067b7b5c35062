//! Request actor models
//!
//! The identity provider resolves one `ActorContext` per request. It is never
//! persisted.

use serde::{Deserialize, Serialize};

use crate::models::opportunity::closed_set;

closed_set! {
    /// Platform role chosen at sign-up
    pub enum Role {
        DealSponsor => "deal_sponsor",
        CapitalPartner => "capital_partner",
        ServiceProvider => "service_provider",
    }
}

/// Who is making the request. `actor_id == None` means anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Option<String>,
    pub role: Option<Role>,
}

impl ActorContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(actor_id: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            role,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.actor_id.is_none()
    }
}
