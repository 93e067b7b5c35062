//! Capital partner interest models
//!
//! Models for POST /api/opportunities/{id}/interest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::opportunity::{closed_set, ClosedSet};
use crate::models::validation::FieldError;

closed_set! {
    #[derive(Default)]
    pub enum InterestKind {
        #[default]
        ExpressInterest => "express_interest",
        RequestInformation => "request_information",
    }
}

/// Request body for registering interest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterestRequest {
    /// Defaults to `express_interest`
    pub kind: InterestKind,
    /// Optional note to the sponsor
    pub message: Option<String>,
}

impl InterestRequest {
    /// Read the request from a JSON body. Unknown keys are ignored and
    /// `null` counts as absent.
    pub fn from_json(body: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(obj) = body.as_object() else {
            return Err(vec![FieldError::new("", "Expected object")]);
        };
        let mut errors = Vec::new();
        let mut request = InterestRequest::default();

        match obj.get("kind") {
            None | Some(Value::Null) => {}
            Some(Value::String(raw)) => match InterestKind::parse(raw) {
                Some(kind) => request.kind = kind,
                None => errors.push(FieldError::new(
                    "kind",
                    format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        InterestKind::allowed_values(),
                        raw
                    ),
                )),
            },
            Some(_) => errors.push(FieldError::new(
                "kind",
                format!("Expected {}", InterestKind::allowed_values()),
            )),
        }

        match obj.get("message") {
            None | Some(Value::Null) => {}
            Some(Value::String(message)) => request.message = Some(message.clone()),
            Some(_) => errors.push(FieldError::new("message", "Expected string")),
        }

        if errors.is_empty() { Ok(request) } else { Err(errors) }
    }
}

/// Max characters kept from an interest message
pub const MAX_INTEREST_MESSAGE_LENGTH: usize = 2000;

/// Interest about to be stored
#[derive(Debug, Clone)]
pub struct NewInterest {
    pub opportunity_id: String,
    pub actor_id: String,
    pub kind: InterestKind,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestRecord {
    pub id: String,
    pub opportunity_id: String,
    pub actor_id: String,
    pub kind: InterestKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}
