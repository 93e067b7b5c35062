//! Identity collaborator
//!
//! Resolves the [`ActorContext`] for a request. Credential exchange (sign-in,
//! sign-up, OAuth code exchange) happens at the authenticating gateway in
//! front of this service; we only read what it forwards.

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::models::actor::{ActorContext, Role};
use crate::models::opportunity::ClosedSet;

/// Header carrying the authenticated user id
pub const ACTOR_ID_HEADER: &str = "x-actor-id";

/// Header carrying the user's platform role
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Max accepted length of an actor id
const MAX_ACTOR_ID_LENGTH: usize = 128;

#[derive(Debug)]
pub enum IdentityError {
    InvalidHeader(String),
    UnknownRole(String),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::InvalidHeader(msg) => write!(f, "Invalid identity header: {}", msg),
            IdentityError::UnknownRole(role) => write!(
                f,
                "Unknown role '{}', expected one of {}",
                role,
                Role::allowed_values()
            ),
        }
    }
}

impl std::error::Error for IdentityError {}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current actor; anonymous when the request carries no identity
    async fn current_actor(&self, headers: &HeaderMap) -> Result<ActorContext, IdentityError>;
}

/// Trusts identity headers set by the authenticating gateway
#[derive(Clone, Default)]
pub struct GatewayHeaderIdentity;

impl GatewayHeaderIdentity {
    pub fn new() -> Self {
        Self
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Result<Option<&'h str>, IdentityError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => {
            let s = value
                .to_str()
                .map_err(|_| IdentityError::InvalidHeader(format!("{} is not valid ASCII", name)))?
                .trim();
            Ok((!s.is_empty()).then_some(s))
        }
    }
}

#[async_trait]
impl IdentityProvider for GatewayHeaderIdentity {
    async fn current_actor(&self, headers: &HeaderMap) -> Result<ActorContext, IdentityError> {
        let Some(actor_id) = header_str(headers, ACTOR_ID_HEADER)? else {
            return Ok(ActorContext::anonymous());
        };
        if actor_id.len() > MAX_ACTOR_ID_LENGTH {
            return Err(IdentityError::InvalidHeader(format!(
                "{} exceeds {} characters",
                ACTOR_ID_HEADER, MAX_ACTOR_ID_LENGTH
            )));
        }

        let role = match header_str(headers, ACTOR_ROLE_HEADER)? {
            None => None,
            Some(raw) => Some(Role::parse(raw).ok_or_else(|| IdentityError::UnknownRole(raw.to_string()))?),
        };

        Ok(ActorContext::authenticated(actor_id, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[tokio::test]
    async fn test_no_headers_is_anonymous() {
        let actor = GatewayHeaderIdentity::new()
            .current_actor(&HeaderMap::new())
            .await
            .unwrap();
        assert!(actor.is_anonymous());
        assert_eq!(actor.role, None);
    }

    #[tokio::test]
    async fn test_role_is_parsed() {
        let actor = GatewayHeaderIdentity::new()
            .current_actor(&headers(&[
                (ACTOR_ID_HEADER, "cp-1"),
                (ACTOR_ROLE_HEADER, "capital_partner"),
            ]))
            .await
            .unwrap();
        assert_eq!(actor, ActorContext::authenticated("cp-1", Some(Role::CapitalPartner)));
    }

    #[tokio::test]
    async fn test_role_without_id_stays_anonymous() {
        let actor = GatewayHeaderIdentity::new()
            .current_actor(&headers(&[(ACTOR_ROLE_HEADER, "deal_sponsor")]))
            .await
            .unwrap();
        assert!(actor.is_anonymous());
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let result = GatewayHeaderIdentity::new()
            .current_actor(&headers(&[
                (ACTOR_ID_HEADER, "u-1"),
                (ACTOR_ROLE_HEADER, "admin"),
            ]))
            .await;
        assert!(matches!(result, Err(IdentityError::UnknownRole(r)) if r == "admin"));
    }
}
