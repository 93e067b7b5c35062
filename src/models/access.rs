//! Opportunity view variants and the actions each one offers

use serde::{Deserialize, Serialize};

/// Which variant of the opportunity the actor gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewVariant {
    /// The sponsor who created the listing
    Owner,
    /// Capital partner: full investor action set
    Investor,
    /// Any other signed-in actor: may only message the sponsor
    Connect,
    /// Signed-out visitor: sign-in call to action
    AnonymousPrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorAction {
    Edit,
    Delete,
    ManageDocuments,
    ExpressInterest,
    RequestInformation,
    MessageSponsor,
    SignIn,
}

impl ViewVariant {
    /// Actions the UI should offer for this variant
    pub fn actions(&self) -> &'static [ActorAction] {
        match self {
            ViewVariant::Owner => &[
                ActorAction::Edit,
                ActorAction::Delete,
                ActorAction::ManageDocuments,
            ],
            ViewVariant::Investor => &[
                ActorAction::ExpressInterest,
                ActorAction::RequestInformation,
                ActorAction::MessageSponsor,
            ],
            ViewVariant::Connect => &[ActorAction::MessageSponsor],
            ViewVariant::AnonymousPrompt => &[ActorAction::SignIn],
        }
    }

    pub fn allows(&self, action: ActorAction) -> bool {
        self.actions().contains(&action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_actions_belong_to_investor_view() {
        assert!(ViewVariant::Investor.allows(ActorAction::ExpressInterest));
        assert!(ViewVariant::Investor.allows(ActorAction::RequestInformation));
        assert!(!ViewVariant::Connect.allows(ActorAction::ExpressInterest));
        assert!(!ViewVariant::Owner.allows(ActorAction::RequestInformation));
        assert_eq!(
            serde_json::to_value(ViewVariant::AnonymousPrompt).unwrap(),
            serde_json::json!("anonymous_prompt")
        );
    }
}
