//! Access policy for opportunity listings
//!
//! Single place deciding what an actor may do with an opportunity. Routes
//! call [`authorize`] before any render or mutation and map the
//! [`Decision`] to a status code or a response shape.

use serde::{Deserialize, Serialize};

pub use crate::models::access::{ActorAction, ViewVariant};
use crate::models::actor::{ActorContext, Role};
use crate::models::opportunity::Opportunity;

/// What the actor asks to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Edit,
    ListDocuments,
}

/// The slice of an opportunity the policy looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef<'a> {
    pub owner_id: &'a str,
    pub public_listing: bool,
}

impl<'a> From<&'a Opportunity> for ResourceRef<'a> {
    fn from(opp: &'a Opportunity) -> Self {
        Self {
            owner_id: &opp.owner_id,
            public_listing: opp.data.visibility.public_listing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotOwner,
    NotAuthenticated,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::NotOwner => "not_owner",
            DenyReason::NotAuthenticated => "not_authenticated",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Denied(DenyReason),
    AllowedAs(ViewVariant),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::AllowedAs(_))
    }
}

/// Decide whether `actor` may perform `action` on `resource`.
///
/// Edits are owner-only and an anonymous actor is always refused with
/// `not_authenticated`, whatever the ownership. Views never fail; they only
/// pick a variant. Document listing needs any signed-in actor.
pub fn authorize(actor: &ActorContext, resource: &ResourceRef<'_>, action: Action) -> Decision {
    let actor_id = actor.actor_id.as_deref();
    let is_owner = actor_id == Some(resource.owner_id);

    match action {
        Action::Edit => match actor_id {
            None => Decision::Denied(DenyReason::NotAuthenticated),
            Some(_) if is_owner => Decision::AllowedAs(ViewVariant::Owner),
            Some(_) => Decision::Denied(DenyReason::NotOwner),
        },
        Action::View => Decision::AllowedAs(view_variant(actor, is_owner)),
        Action::ListDocuments => {
            if actor.is_anonymous() {
                Decision::Denied(DenyReason::NotAuthenticated)
            } else {
                Decision::AllowedAs(view_variant(actor, is_owner))
            }
        }
    }
}

fn view_variant(actor: &ActorContext, is_owner: bool) -> ViewVariant {
    if is_owner {
        return ViewVariant::Owner;
    }
    match (&actor.actor_id, actor.role) {
        (Some(_), Some(Role::CapitalPartner)) => ViewVariant::Investor,
        (Some(_), _) => ViewVariant::Connect,
        (None, _) => ViewVariant::AnonymousPrompt,
    }
}
